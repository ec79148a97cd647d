mod platform;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use engine_logging::engine_info;
use jobscout_core::SecurityPolicy;
use jobscout_engine::{FetchRequest, JobPostingService};

use platform::logging::{self, LogDestination};

#[derive(Debug, Parser)]
#[command(name = "jobscout", about = "Fetch a job posting URL and print its text as JSON")]
struct Args {
    /// Job posting URL.
    url: String,

    /// Wall-clock limit for the whole fetch.
    #[arg(long, default_value_t = 8)]
    timeout_secs: u64,

    /// Response size ceiling in bytes.
    #[arg(long, default_value_t = 5 * 1024 * 1024)]
    max_bytes: u64,

    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    log: LogDestination,

    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn policy(&self) -> SecurityPolicy {
        SecurityPolicy {
            fetch_timeout: Duration::from_secs(self.timeout_secs),
            max_response_bytes: self.max_bytes,
            ..SecurityPolicy::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    logging::initialize(args.log, args.verbose);

    let service = JobPostingService::new(args.policy());
    let response = service
        .extract_job_posting(FetchRequest::new(args.url.clone()))
        .await;

    println!("{}", response.body_json()?);
    engine_info!("finished with status {}", response.status);

    Ok(if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_policy_limits() {
        let args = Args::parse_from([
            "jobscout",
            "https://example.com/job",
            "--timeout-secs",
            "3",
            "--max-bytes",
            "1024",
            "--log",
            "both",
        ]);
        let policy = args.policy();
        assert_eq!(policy.fetch_timeout, Duration::from_secs(3));
        assert_eq!(policy.max_response_bytes, 1024);
        assert_eq!(policy.min_content_chars, 100);
        assert_eq!(args.log, LogDestination::Both);
    }

    #[test]
    fn defaults_match_policy_defaults() {
        let args = Args::parse_from(["jobscout", "https://example.com/job"]);
        assert_eq!(args.policy(), SecurityPolicy::default());
    }
}
