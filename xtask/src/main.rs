//! Build tasks: man pages and shell completions for `salsa-spa`.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "xtask", about = "Development tasks for salsa-spa")]
struct Xtask {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Generate man pages
    Man {
        /// Output directory
        #[arg(long, default_value = "target/man")]
        out_dir: PathBuf,
    },
    /// Generate shell completions
    Completions {
        /// Output directory
        #[arg(long, default_value = "target/completions")]
        out_dir: PathBuf,
        /// Shells to generate for (all when omitted)
        #[arg(long, value_enum)]
        shell: Vec<ShellArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ShellArg {
    Bash,
    Zsh,
    Fish,
    Elvish,
    Powershell,
}

impl From<ShellArg> for Shell {
    fn from(shell: ShellArg) -> Self {
        match shell {
            ShellArg::Bash => Self::Bash,
            ShellArg::Zsh => Self::Zsh,
            ShellArg::Fish => Self::Fish,
            ShellArg::Elvish => Self::Elvish,
            ShellArg::Powershell => Self::PowerShell,
        }
    }
}

fn main() -> std::io::Result<()> {
    match Xtask::parse().command {
        Task::Man { out_dir } => gen_man(&out_dir),
        Task::Completions { out_dir, shell } => {
            let shells: Vec<Shell> = if shell.is_empty() {
                vec![
                    Shell::Bash,
                    Shell::Zsh,
                    Shell::Fish,
                    Shell::Elvish,
                    Shell::PowerShell,
                ]
            } else {
                shell.into_iter().map(Shell::from).collect()
            };
            gen_completions(&out_dir, &shells)
        }
    }
}

fn gen_man(out_dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(out_dir)?;
    let cmd = salsa_spa::command();
    clap_mangen::generate_to(cmd, out_dir)?;
    println!("man pages written to {}", out_dir.display());
    Ok(())
}

fn gen_completions(out_dir: &Path, shells: &[Shell]) -> std::io::Result<()> {
    fs::create_dir_all(out_dir)?;
    for shell in shells {
        let mut cmd = salsa_spa::command();
        let path = clap_complete::generate_to(*shell, &mut cmd, "salsa-spa", out_dir)?;
        println!("{}", path.display());
    }
    Ok(())
}
