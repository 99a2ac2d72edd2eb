//! Config subcommand handlers.

use std::fmt::Write;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

/// Format config for display, masking the token.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "[api]");
    let _ = writeln!(out, "base_url = \"{}\"", cfg.api.base_url);
    let _ = writeln!(out, "timeout = {}", cfg.api.timeout);
    let _ = writeln!(out, "insecure = {}", cfg.api.insecure);
    if let Some(ref env) = cfg.api.access_token_env {
        let _ = writeln!(out, "access_token_env = \"{env}\"");
    }
    if cfg.api.access_token.is_some() {
        let _ = writeln!(out, "access_token = \"****\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[paging]");
    let _ = writeln!(out, "page_size = {}", cfg.paging.page_size);
    let _ = writeln!(out, "prefetch_distance = {}", cfg.paging.prefetch_distance);
    let _ = write!(out, "refresh_policy = \"{}\"", cfg.paging.refresh_policy);

    out
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::effective_config(global)?;
            output::print_output(&format_config_redacted(&cfg), global.quiet);
            Ok(())
        }

        ConfigCommand::Init { base_url, force } => {
            let path = config::config_path();
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }

            let mut cfg = Config::default();
            if let Some(url) = base_url {
                cfg.api.base_url = url;
            }
            // Reject a bad URL before it lands on disk.
            cfg.to_backend_config()?;

            let written = config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Wrote {}", written.display());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redaction_hides_plaintext_token() {
        let mut cfg = Config::default();
        cfg.api.access_token = Some("s3cret".into());
        cfg.api.access_token_env = Some("SCHOOL_TOKEN".into());

        let text = format_config_redacted(&cfg);
        assert!(!text.contains("s3cret"));
        assert!(text.contains("access_token = \"****\""));
        assert!(text.contains("access_token_env = \"SCHOOL_TOKEN\""));
        assert!(text.contains("page_size = 10"));
    }
}
