//! # Turtle Executable Parameters
//!
//! This module provide parameters for the turtle executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TurtleExecParams {

    /// Directory of the JSON path store. Relative paths are relative to the software root. If not
    /// set paths are only kept in memory and are lost when the executable exits.
    #[serde(default)]
    pub path_store_dir: Option<String>,

    /// Time after the last message from a client at which its session is closed. Clients with a
    /// running mission never expire, and the time counts from the end of a mission. If not set
    /// sessions are only closed by an explicit disconnect.
    #[serde(default)]
    pub client_timeout_s: Option<f64>,

    /// Minimum distance between two consecutive recorded points
    pub recorder_min_separation_m: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for TurtleExecParams {
    fn default() -> Self {
        Self {
            path_store_dir: None,
            client_timeout_s: None,
            recorder_min_separation_m: 0.05,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_optional_fields() {
        let p: TurtleExecParams = util::params::from_str("recorder_min_separation_m = 0.1").unwrap();
        assert_eq!(p.path_store_dir, None);
        assert_eq!(p.client_timeout_s, None);

        let p: TurtleExecParams = util::params::from_str(r#"
            path_store_dir = "paths"
            client_timeout_s = 5.0
            recorder_min_separation_m = 0.05
        "#).unwrap();
        assert_eq!(p.path_store_dir.as_deref(), Some("paths"));
        assert_eq!(p.client_timeout_s, Some(5.0));
    }

    #[test]
    fn test_default_never_expires_clients() {
        assert_eq!(TurtleExecParams::default().client_timeout_s, None);
    }
}
