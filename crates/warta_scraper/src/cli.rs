use clap::Args;
use warta_core::{DateRange, Result, ScrapeResult};

use crate::manager::ScraperManager;

#[derive(Args, Debug, Clone)]
pub struct ScraperArgs {
    /// Listing page to harvest (e.g. a regional news index)
    pub url: String,

    /// First day to keep, YYYY-MM-DD
    #[arg(long)]
    pub start: String,

    /// Last day to keep (inclusive), YYYY-MM-DD
    #[arg(long)]
    pub end: String,
}

pub async fn handle_command(args: ScraperArgs, manager: &ScraperManager) -> Result<ScrapeResult> {
    let range = DateRange::parse(&args.start, &args.end)?;
    manager.scrape_and_save(&args.url, &range).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: ScraperArgs,
    }

    #[test]
    fn test_parse_args() {
        let cli = TestCli::try_parse_from([
            "warta",
            "https://x.id/indeks",
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-31",
        ])
        .unwrap();
        assert_eq!(cli.args.url, "https://x.id/indeks");
        assert_eq!(cli.args.end, "2024-01-31");
    }

    #[test]
    fn test_dates_are_required() {
        assert!(TestCli::try_parse_from(["warta", "https://x.id/indeks"]).is_err());
    }
}
