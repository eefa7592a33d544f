use anyhow::Result;
use clap::{Args, Subcommand};
use xshell::{Shell, cmd};

#[derive(Subcommand)]
pub enum Command {
    /// Check formatting, run clippy, then run the test suite
    Ci,
    /// Apply rustfmt to all files
    Fmt,
    /// Run tests
    Test(Test),
}

#[derive(Args)]
pub struct Test {
    /// Only test this package
    #[arg(long, short)]
    package: Option<String>,

    /// Additional arguments to pass to cargo test
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Command {
    pub fn run(self, sh: &Shell) -> Result<()> {
        match self {
            Command::Ci => {
                eprintln!("Running cargo fmt check...");
                cmd!(sh, "cargo fmt --all -- --check").run()?;
                eprintln!("Running cargo clippy...");
                cmd!(
                    sh,
                    "cargo clippy --all-features --all-targets --workspace -- -D warnings"
                )
                .run()?;
                eprintln!("Running cargo test...");
                cmd!(sh, "cargo test --workspace").run()?;
                Ok(())
            }
            Command::Fmt => {
                cmd!(sh, "cargo fmt --all").run()?;
                Ok(())
            }
            Command::Test(test) => {
                let package = match &test.package {
                    Some(name) => vec!["--package".to_string(), name.clone()],
                    None => vec!["--workspace".to_string()],
                };
                let args = &test.args;
                cmd!(sh, "cargo test {package...} {args...}").run()?;
                Ok(())
            }
        }
    }
}
