//! `access-key` command: asks the backend to issue a registration key.

use timetable_core::{AccessKey, Backend};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn detail(key: &AccessKey) -> String {
    format!(
        "Key:     {}\nExpires: {}",
        key.key,
        key.expires_at.format("%Y-%m-%d %H:%M UTC")
    )
}

pub async fn handle(backend: &Backend, global: &GlobalOpts) -> Result<(), CliError> {
    let key = backend.generate_access_key().await?;
    let out = output::render_single(global.output, &key, detail, |k| k.key.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn detail_shows_key_and_expiry() {
        let key = AccessKey {
            key: "K7-2QX".into(),
            expires_at: Utc.with_ymd_and_hms(2024, 9, 22, 10, 13, 20).unwrap(),
        };
        assert_eq!(detail(&key), "Key:     K7-2QX\nExpires: 2024-09-22 10:13 UTC");
    }
}
