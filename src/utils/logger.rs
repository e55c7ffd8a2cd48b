use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CLI_FILTER: &str = "coffee_protocol=warn";
const CLI_VERBOSE_FILTER: &str = "coffee_protocol=debug,warn";
/// The lambda binary logs under its own `lambda` target.
const LAMBDA_FILTER: &str = "coffee_protocol=info,lambda=info";

/// `RUST_LOG` wins over the built-in directives.
fn filter_or(default_directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives))
}

pub fn init_cli_logger(verbose: bool) {
    let filter = filter_or(if verbose { CLI_VERBOSE_FILTER } else { CLI_FILTER });

    // 終端畫面由問卷本身佔用，日誌一律寫到 stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .compact(),
        )
        .init();
}

pub fn init_lambda_logger() {
    tracing_subscriber::registry()
        .with(filter_or(LAMBDA_FILTER))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .without_time()
                .json()
                .flatten_event(true)
                .with_current_span(false),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters_parse() {
        for directives in [CLI_FILTER, CLI_VERBOSE_FILTER, LAMBDA_FILTER] {
            assert!(directives.parse::<EnvFilter>().is_ok(), "{}", directives);
        }
    }

    #[test]
    fn test_lambda_filter_keeps_entry_point_logs() {
        let directives: Vec<&str> = LAMBDA_FILTER.split(',').collect();
        assert!(directives.contains(&"lambda=info"));
        assert!(directives.contains(&"coffee_protocol=info"));
    }
}
