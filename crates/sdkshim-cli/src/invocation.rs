//! The command line, environment and directories of the wrapped call

use serde::Serialize;

/// Everything the wrapper knows about how it was called.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Invocation {
    /// The command line, starting with the invoked program.
    pub args: Vec<String>,
    /// Environment as `KEY=VAL` strings, in process order.
    pub env: Vec<String>,
    pub home: String,
    pub pwd: String,
}

impl Invocation {
    /// Capture the current process with `args` as the wrapped command line.
    pub fn capture(args: Vec<String>) -> Self {
        let env = std::env::vars_os()
            .map(|(k, v)| format!("{}={}", k.to_string_lossy(), v.to_string_lossy()))
            .collect();
        let home = dirs::home_dir()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let pwd = std::env::current_dir()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            args,
            env,
            home,
            pwd,
        }
    }

    /// Value of `key` in the captured environment; the last entry wins.
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .filter_map(|entry| entry.split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

/// Split `KEY=VAL` entries into pairs, skipping entries without `=`.
pub fn env_pairs(env: &[String]) -> impl Iterator<Item = (&str, &str)> {
    env.iter().filter_map(|entry| entry.split_once('='))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_last_wins() {
        let inv = Invocation {
            env: vec!["A=1".into(), "B=2".into(), "A=3".into()],
            ..Default::default()
        };
        assert_eq!(inv.env_var("A"), Some("3"));
        assert_eq!(inv.env_var("C"), None);
    }

    #[test]
    fn test_env_pairs_skip_malformed() {
        let env = vec!["A=1".to_string(), "junk".to_string(), "B=x=y".to_string()];
        let pairs: Vec<_> = env_pairs(&env).collect();
        assert_eq!(pairs, vec![("A", "1"), ("B", "x=y")]);
    }

    #[test]
    fn test_capture_records_args() {
        let inv = Invocation::capture(vec!["cmake".into(), "..".into()]);
        assert_eq!(inv.args, vec!["cmake", ".."]);
        assert!(!inv.pwd.is_empty());
    }
}
