//! Endpoint reference resolution

use serde::{Deserialize, Serialize};
use log::{debug, error};

use crate::config::SettingsSnapshot;
use crate::error::Error;

/// Logical reference to a dispatch destination
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndpointRef
{   /// The legacy local endpoint slot
    Local
  , /// The legacy remote endpoint slot
    Remote
  , /// A named user-defined profile
    Profile(String)
}

impl EndpointRef
{   /// Parse the wire form: "local", "remote" or "profile:<name>"
    pub fn parse(raw: &str) -> Option<Self>
    {   match raw
        {   "local" => Some(EndpointRef::Local)
          , "remote" => Some(EndpointRef::Remote)
          , other => {
              other.strip_prefix("profile:")
                .map(|name| EndpointRef::Profile(name.to_string()))
            }
        }
    }

    /// Canonical wire string; doubles as the telemetry key
    pub fn label(&self) -> String
    {   match self
        {   EndpointRef::Local => "local".to_string()
          , EndpointRef::Remote => "remote".to_string()
          , EndpointRef::Profile(name) => {
              format!("profile:{}", name)
            }
        }
    }
}

impl std::fmt::Display for EndpointRef
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
      -> std::fmt::Result
    {   write!(f, "{}", self.label())
    }
}

/// Concrete destination a reference resolves to
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointConfig
{   /// Target URL, non-empty once resolution succeeds
    pub url: String
  , /// Bearer token, attached iff present
    pub token: Option<String>
  , /// Default instruction text for the endpoint
    pub default_preamble: Option<String>
  , /// Default sampling temperature for the endpoint
    pub default_temperature: Option<f32>
}

/// Map a logical reference to a concrete endpoint configuration.
///
/// Pure function of its inputs; callers re-resolve on every dispatch
/// because the profile list may change between calls. Duplicate
/// profile names resolve to the first match in list order.
pub fn resolve(
  reference: &EndpointRef
, snapshot: &SettingsSnapshot
) -> Result<EndpointConfig, Error>
{   debug!("Resolving endpoint: {}", reference.label());

    let config = match reference
    {   EndpointRef::Local => {
          EndpointConfig
          {   url: snapshot.local_endpoint.clone()
            , token: non_empty(&snapshot.local_auth_token)
            , default_preamble: None
            , default_temperature: None
          }
        }
      , EndpointRef::Remote => {
          EndpointConfig
          {   url: snapshot.remote_endpoint.clone()
            , token: non_empty(&snapshot.remote_auth_token)
            , default_preamble: None
            , default_temperature: None
          }
        }
      , EndpointRef::Profile(name) => {
          // Case-sensitive exact match, first hit wins
          let profile = snapshot.profiles
            .iter()
            .find(|p| p.name == *name)
            .ok_or_else(|| {
              error!("Profile not found: {}", name);
              Error::ProfileNotFound(name.clone())
            })?;

          EndpointConfig
          {   url: profile.url.clone()
            , token: profile.auth_token
                .as_deref()
                .and_then(non_empty)
            , default_preamble: profile.default_preamble.clone()
            , default_temperature: profile.default_temperature
          }
        }
    };

    if config.url.trim().is_empty()
    {   error!("No URL configured for: {}", reference.label());
        return Err(Error::EndpointNotConfigured(
          reference.label()
        ));
    }

    Ok(config)
}

fn non_empty(s: &str) -> Option<String>
{   if s.trim().is_empty()
    {   None
    } else
    {   Some(s.to_string())
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::config::Profile;

    fn snapshot_with_profiles(profiles: Vec<Profile>)
      -> SettingsSnapshot
    {   SettingsSnapshot
        {   local_endpoint: "http://localhost:8080".to_string()
          , remote_endpoint: String::new()
          , local_auth_token: String::new()
          , remote_auth_token: String::new()
          , request_timeout_ms: None
          , profiles
        }
    }

    fn profile(name: &str, url: &str) -> Profile
    {   Profile
        {   name: name.to_string()
          , url: url.to_string()
          , auth_token: None
          , default_preamble: None
          , default_temperature: None
        }
    }

    #[test]
    fn parse_wire_forms()
    {   assert_eq!(
          EndpointRef::parse("local"),
          Some(EndpointRef::Local)
        );
        assert_eq!(
          EndpointRef::parse("remote"),
          Some(EndpointRef::Remote)
        );
        assert_eq!(
          EndpointRef::parse("profile:work"),
          Some(EndpointRef::Profile("work".to_string()))
        );
        assert_eq!(EndpointRef::parse("ftp"), None);
    }

    #[test]
    fn label_round_trips()
    {   let reference
          = EndpointRef::Profile("work".to_string());
        assert_eq!(reference.label(), "profile:work");
        assert_eq!(
          EndpointRef::parse(&reference.label()),
          Some(reference)
        );
    }

    #[test]
    fn local_resolves_to_legacy_slot()
    {   let snapshot = snapshot_with_profiles(vec![]);
        let config
          = resolve(&EndpointRef::Local, &snapshot).unwrap();
        assert_eq!(config.url, "http://localhost:8080");
        assert_eq!(config.token, None);
    }

    #[test]
    fn empty_url_is_not_configured()
    {   let snapshot = snapshot_with_profiles(vec![]);
        let result = resolve(&EndpointRef::Remote, &snapshot);
        assert_eq!(
          result,
          Err(Error::EndpointNotConfigured(
            "remote".to_string()
          ))
        );
    }

    #[test]
    fn missing_profile_is_an_error()
    {   let snapshot = snapshot_with_profiles(vec![]);
        let result = resolve(
          &EndpointRef::Profile("X".to_string()),
          &snapshot
        );
        assert_eq!(
          result,
          Err(Error::ProfileNotFound("X".to_string()))
        );
        assert_eq!(
          result.unwrap_err().to_string(),
          "Profile 'X' not found"
        );
    }

    #[test]
    fn duplicate_profile_names_take_first_match()
    {   let snapshot = snapshot_with_profiles(vec![
          profile("work", "http://first.example")
        , profile("work", "http://second.example")
        ]);
        let config = resolve(
          &EndpointRef::Profile("work".to_string()),
          &snapshot
        ).unwrap();
        assert_eq!(config.url, "http://first.example");
    }

    #[test]
    fn profile_lookup_is_case_sensitive()
    {   let snapshot = snapshot_with_profiles(vec![
          profile("Work", "http://cased.example")
        ]);
        let result = resolve(
          &EndpointRef::Profile("work".to_string()),
          &snapshot
        );
        assert_eq!(
          result,
          Err(Error::ProfileNotFound("work".to_string()))
        );
    }

    #[test]
    fn blank_tokens_are_dropped()
    {   let mut snapshot = snapshot_with_profiles(vec![]);
        snapshot.local_auth_token = "  ".to_string();
        let config
          = resolve(&EndpointRef::Local, &snapshot).unwrap();
        assert_eq!(config.token, None);

        snapshot.local_auth_token = "secret".to_string();
        let config
          = resolve(&EndpointRef::Local, &snapshot).unwrap();
        assert_eq!(config.token, Some("secret".to_string()));
    }

    #[test]
    fn profile_defaults_carry_through()
    {   let mut entry
          = profile("tuned", "http://tuned.example");
        entry.default_preamble
          = Some("Answer briefly".to_string());
        entry.default_temperature = Some(0.2);
        let snapshot = snapshot_with_profiles(vec![entry]);

        let config = resolve(
          &EndpointRef::Profile("tuned".to_string()),
          &snapshot
        ).unwrap();
        assert_eq!(
          config.default_preamble.as_deref(),
          Some("Answer briefly")
        );
        assert_eq!(config.default_temperature, Some(0.2));
    }
}
