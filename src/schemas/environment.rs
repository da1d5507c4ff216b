// Snapshot of the ambient environment the pipeline depends on.
// Captured once at startup so that every step sees the same values and tests
// can construct one directly instead of mutating process environment variables.

use std::path::PathBuf;

use crate::errors::{Result, SetupError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// Raw platform identifier (`$OSTYPE`, or the compile-time target OS).
    pub platform_id: String,
    pub home: PathBuf,
    pub user: String,
    /// Current login shell as reported by `$SHELL`.
    pub login_shell: Option<String>,
    /// `$ZSH_CUSTOM` override for the framework's custom directory.
    pub zsh_custom: Option<PathBuf>,
}

impl Environment {
    /// Reads the environment of the current process.
    ///
    /// # Returns
    /// * `Err(SetupError::MissingEnvironment)` when neither the home directory nor
    ///   `USER`/`LOGNAME` can be determined; nothing can be provisioned without them.
    pub fn from_process() -> Result<Self> {
        let platform_id = non_empty_var("OSTYPE").unwrap_or_else(|| std::env::consts::OS.to_string());
        let home = dirs::home_dir().ok_or(SetupError::MissingEnvironment("home directory"))?;
        let user = non_empty_var("USER")
            .or_else(|| non_empty_var("LOGNAME"))
            .ok_or(SetupError::MissingEnvironment("user name (USER/LOGNAME)"))?;

        Ok(Self {
            platform_id,
            home,
            user,
            login_shell: non_empty_var("SHELL"),
            zsh_custom: non_empty_var("ZSH_CUSTOM").map(PathBuf::from),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [
        ("OSTYPE", "linux-gnu"),
        ("USER", "dev"),
        ("HOME", "/home/dev"),
        ("SHELL", "/bin/bash"),
        ("ZSH_CUSTOM", "/home/dev/zsh-custom"),
    ])]
    fn reads_all_consumed_variables() {
        let env = Environment::from_process().expect("complete environment");
        assert_eq!(
            env,
            Environment {
                platform_id: "linux-gnu".into(),
                home: PathBuf::from("/home/dev"),
                user: "dev".into(),
                login_shell: Some("/bin/bash".into()),
                zsh_custom: Some(PathBuf::from("/home/dev/zsh-custom")),
            }
        );
    }

    #[sealed_test(env = [("USER", ""), ("LOGNAME", "fallback"), ("ZSH_CUSTOM", "")])]
    fn falls_back_to_logname_and_ignores_blank_values() {
        let env = Environment::from_process().expect("complete environment");
        assert_eq!(env.user, "fallback");
        assert_eq!(env.zsh_custom, None);
    }
}
