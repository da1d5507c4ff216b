// Test-only recording `CommandRunner`.
//
// Records every command, answers PATH lookups from an in-memory table and
// simulates the handful of side effects the pipeline later checks for
// (`sudo tee`, `sudo rm -f`, and optionally the remote installers) against
// real files inside a temporary home directory.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::libs::command_runner::{CommandOutput, CommandRunner, CommandSpec};
use crate::schemas::setup_config::SetupConfig;

type Behaviour = Box<dyn Fn(&FakeRunner, &CommandSpec) -> CommandOutput>;

#[derive(Default)]
pub struct FakeRunner {
    calls: RefCell<Vec<CommandSpec>>,
    programs: RefCell<BTreeMap<String, PathBuf>>,
    failures: RefCell<Vec<(String, i32)>>,
    behaviours: RefCell<Vec<(String, Behaviour)>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_program(&self, name: &str, path: impl Into<PathBuf>) {
        self.programs.borrow_mut().insert(name.to_string(), path.into());
    }

    /// Any command whose command line contains `needle` exits with `code`.
    pub fn fail_when(&self, needle: &str, code: i32) {
        self.failures.borrow_mut().push((needle.to_string(), code));
    }

    /// Any command whose command line contains `needle` runs `behaviour`.
    pub fn on<F>(&self, needle: &str, behaviour: F)
    where
        F: Fn(&FakeRunner, &CommandSpec) -> CommandOutput + 'static,
    {
        self.behaviours
            .borrow_mut()
            .push((needle.to_string(), Box::new(behaviour)));
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(CommandSpec::command_line).collect()
    }

    pub fn count_matching(&self, needle: &str) -> usize {
        self.command_lines()
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Makes every remote installer, package install and clone leave behind
    /// what the real one would, so presence checks flip after installation.
    /// The Oh My Zsh installer moves an existing `.zshrc` aside before writing
    /// its template.
    pub fn simulate_workstation(&self, home: &Path, config: &SetupConfig) {
        let brew_path = home.join(".linuxbrew/bin/brew");
        self.on(&config.installers.homebrew_url, move |runner, _| {
            runner.add_program("brew", brew_path.clone());
            CommandOutput::success()
        });

        self.on("install -y zsh", |runner, _| {
            runner.add_program("zsh", "/usr/bin/zsh");
            CommandOutput::success()
        });

        let omz_home = home.to_path_buf();
        self.on(&config.installers.oh_my_zsh_url, move |_, _| {
            let omz = omz_home.join(".oh-my-zsh");
            fs::create_dir_all(omz.join("custom/plugins")).expect("create framework dir");
            fs::write(omz.join("oh-my-zsh.sh"), "# framework\n").expect("write framework");
            let zshrc = omz_home.join(".zshrc");
            if zshrc.exists() {
                fs::rename(&zshrc, omz_home.join(".zshrc.pre-oh-my-zsh")).expect("move old zshrc aside");
            }
            fs::write(
                zshrc,
                "export ZSH=\"$HOME/.oh-my-zsh\"\nZSH_THEME=\"robbyrussell\"\nplugins=(git)\nsource $ZSH/oh-my-zsh.sh\n",
            )
            .expect("write template zshrc");
            CommandOutput::success()
        });

        self.on("git clone", |_, spec| {
            let dest = spec.args.last().expect("clone destination");
            fs::create_dir_all(dest).expect("create plugin dir");
            CommandOutput::success()
        });

        self.on(&config.installers.starship_url, |runner, _| {
            runner.add_program("starship", "/usr/local/bin/starship");
            CommandOutput::success()
        });

        self.on("starship preset", |_, spec| {
            let out = spec
                .args
                .iter()
                .position(|arg| arg == "-o")
                .and_then(|i| spec.args.get(i + 1))
                .expect("preset output path");
            fs::write(out, "\"$schema\" = 'https://starship.rs/config-schema.json'\nformat = \"$all\"\n")
                .expect("write theme");
            CommandOutput::success()
        });

        let uv_path = home.join(".local/bin/uv");
        self.on(&config.installers.uv_url, move |runner, _| {
            runner.add_program("uv", uv_path.clone());
            CommandOutput::success()
        });
    }

    fn simulate_sudo_file_ops(spec: &CommandSpec) -> Option<CommandOutput> {
        if spec.program != "sudo" {
            return None;
        }
        let args: Vec<&str> = spec.args.iter().map(String::as_str).collect();
        match args.as_slice() {
            ["tee", "-a", path] => {
                let mut file = fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .expect("append via tee");
                file.write_all(spec.stdin.as_deref().unwrap_or_default().as_bytes())
                    .expect("write via tee");
                Some(CommandOutput::success())
            }
            ["tee", path] => {
                fs::write(path, spec.stdin.as_deref().unwrap_or_default()).expect("write via tee");
                Some(CommandOutput::success())
            }
            ["rm", "-f", path] => {
                let _ = fs::remove_file(path);
                Some(CommandOutput::success())
            }
            _ => None,
        }
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(spec.clone());
        let line = spec.command_line();

        if let Some((_, code)) = self
            .failures
            .borrow()
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
        {
            return Ok(CommandOutput::failure(*code, format!("simulated failure of `{line}`")));
        }

        let behaviours = self.behaviours.borrow();
        if let Some((_, behaviour)) = behaviours
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
        {
            return Ok(behaviour(self, spec));
        }

        Ok(Self::simulate_sudo_file_ops(spec).unwrap_or_else(CommandOutput::success))
    }

    fn find_program(&self, program: &str) -> Option<PathBuf> {
        self.programs.borrow().get(program).cloned()
    }
}
