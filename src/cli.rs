use std::path::PathBuf;

use chrono::DateTime;

use crate::model::RawGameRecord;

#[derive(Debug, Default, PartialEq)]
pub struct Cli {
    pub user: Option<String>,
    pub inputs: Vec<PathBuf>,  // empty => stdin
    pub out: Option<PathBuf>,  // CSV output
    pub max: Option<usize>,    // keep the first N games after filtering
    pub perf: Option<String>,  // "bullet", "blitz", "rapid", ...
    pub since: Option<String>, // "YYYY-MM" (lower bound, inclusive)
    pub until: Option<String>, // "YYYY-MM" (upper bound, inclusive)
    pub parallel: bool,
    pub example: bool,
    pub verbose: bool,
    pub help: bool,
}

pub fn parse() -> anyhow::Result<Cli> {
    parse_from(std::env::args().skip(1))
}

pub fn parse_from<I>(args: I) -> anyhow::Result<Cli>
where
    I: IntoIterator<Item = String>,
{
    let mut cli = Cli::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| {
            it.next()
                .ok_or_else(|| anyhow::anyhow!("{} needs a value", flag))
        };
        match arg.as_str() {
            "--user" | "-u" => cli.user = Some(value(&arg)?),
            "--out" | "-o" => cli.out = Some(PathBuf::from(value(&arg)?)),
            "--max" | "--games" => {
                let n = value(&arg)?;
                cli.max = Some(
                    n.parse()
                        .map_err(|_| anyhow::anyhow!("--max expects a number, got {:?}", n))?,
                );
            }
            "--perf" | "--time-control" => cli.perf = Some(value(&arg)?.to_lowercase()),
            "--since" | "--from" => cli.since = Some(month_arg(&arg, value(&arg)?)?),
            "--until" => cli.until = Some(month_arg(&arg, value(&arg)?)?),
            "--parallel" => cli.parallel = true,
            "--example" => cli.example = true,
            "--verbose" | "-v" => cli.verbose = true,
            "--help" | "-h" => cli.help = true,
            s if s.starts_with('-') => anyhow::bail!("unknown option {}", s),
            _ => cli.inputs.push(PathBuf::from(&arg)),
        }
    }
    Ok(cli)
}

fn month_arg(flag: &str, m: String) -> anyhow::Result<String> {
    let b = m.as_bytes();
    let ok = b.len() == 7
        && b[4] == b'-'
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[5..].iter().all(u8::is_ascii_digit)
        && (1..=12).contains(&m[5..].parse::<u8>().unwrap_or(0));
    if !ok {
        anyhow::bail!("{} expects YYYY-MM, got {:?}", flag, m);
    }
    Ok(m)
}

/// "YYYY-MM" of a game's start, if it carries a timestamp.
fn month_of(r: &RawGameRecord) -> Option<String> {
    let ms = r.created_at?;
    DateTime::from_timestamp_millis(ms).map(|t| t.format("%Y-%m").to_string())
}

impl Cli {
    /// Apply the perf and month filters, then `--max`. Games without a
    /// timestamp are never dropped by the month bounds.
    pub fn select(&self, records: Vec<RawGameRecord>) -> Vec<RawGameRecord> {
        let keep = |r: &RawGameRecord| {
            if let Some(p) = &self.perf {
                if !r.perf.as_deref().is_some_and(|rp| rp.eq_ignore_ascii_case(p)) {
                    return false;
                }
            }
            if let Some(month) = month_of(r) {
                if self.since.as_deref().is_some_and(|s| month.as_str() < s) {
                    return false;
                }
                if self.until.as_deref().is_some_and(|u| month.as_str() > u) {
                    return false;
                }
            }
            true
        };
        records
            .into_iter()
            .filter(keep)
            .take(self.max.unwrap_or(usize::MAX))
            .collect()
    }
}

pub fn print_help() {
    eprintln!(
r#"openingstats: per-color results and top openings for one Lichess player

Usage:
  openingstats --user NAME [games.ndjson[.zst] ...] [options]
  lichess-export | openingstats --user NAME [options]
  openingstats --example

Input is the Lichess game export (one JSON game per line). With no files,
games are read from stdin.

Options:
  -u, --user NAME             Player to analyze (case-insensitive).
  --max, --games N            Only the first N games (after filters).
  --perf, --time-control T    Only games with this perf (bullet, blitz, rapid, ...).
  --since YYYY-MM, --from     Only games started in or after this month.
  --until YYYY-MM             Only games started in or before this month.
  -o, --out PATH              Also write the top openings as CSV.
  --parallel                  Fold large inputs in parallel batches.
  --example                   Print the built-in example report and exit.
  -v, --verbose               Progress and skip counts on stderr.
  -h, --help                  Show this help.

Notes:
  • Games where the player's rating was provisional are left out.
  • Batch size, parallel threshold and thread count come from config.toml
    (or the file named by OPENINGSTATS_CONFIG).
"#);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(s: &str) -> anyhow::Result<Cli> {
        parse_from(s.split_whitespace().map(String::from))
    }

    fn game(perf: Option<&str>, created_at: Option<i64>) -> RawGameRecord {
        serde_json::from_value(json!({ "perf": perf, "createdAt": created_at })).unwrap()
    }

    // 2024-03-15T12:00:00Z and 2024-05-01T00:00:00Z
    const MARCH: i64 = 1_710_504_000_000;
    const MAY: i64 = 1_714_521_600_000;

    #[test]
    fn test_parse_full() {
        let cli = args("-u Alice a.ndjson b.ndjson.zst --max 50 --perf Blitz --since 2024-01 --until 2024-06 -o out.csv --parallel -v").unwrap();
        assert_eq!(cli.user.as_deref(), Some("Alice"));
        assert_eq!(cli.inputs, vec![PathBuf::from("a.ndjson"), PathBuf::from("b.ndjson.zst")]);
        assert_eq!(cli.max, Some(50));
        assert_eq!(cli.perf.as_deref(), Some("blitz"));
        assert_eq!(cli.since.as_deref(), Some("2024-01"));
        assert_eq!(cli.until.as_deref(), Some("2024-06"));
        assert_eq!(cli.out, Some(PathBuf::from("out.csv")));
        assert!(cli.parallel && cli.verbose);
        assert!(!cli.example && !cli.help);
    }

    #[test]
    fn test_parse_errors() {
        assert!(args("--user").is_err());
        assert!(args("--max lots").is_err());
        assert!(args("--since 2024-13").is_err());
        assert!(args("--until 24-01").is_err());
        assert!(args("--frobnicate").is_err());
    }

    #[test]
    fn test_select_by_perf_and_max() {
        let cli = args("--perf blitz --max 2").unwrap();
        let records = vec![
            game(Some("blitz"), None),
            game(Some("bullet"), None),
            game(None, None),
            game(Some("BLITZ"), None),
            game(Some("blitz"), None),
        ];
        assert_eq!(cli.select(records).len(), 2);
    }

    #[test]
    fn test_select_by_month() {
        let cli = args("--since 2024-04").unwrap();
        let kept = cli.select(vec![game(None, Some(MARCH)), game(None, Some(MAY)), game(None, None)]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].created_at, Some(MAY));

        let cli = args("--until 2024-03").unwrap();
        let kept = cli.select(vec![game(None, Some(MARCH)), game(None, Some(MAY))]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].created_at, Some(MARCH));
    }

    #[test]
    fn test_select_without_filters_keeps_everything() {
        let cli = Cli::default();
        assert_eq!(cli.select(vec![game(None, None); 3]).len(), 3);
    }
}
