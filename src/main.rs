use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use pdfgen::common::{start_application, StartupConfig};
use pdfgen_config::HeaderOverrides;

fn cli() -> Command {
    Command::new("pdfgen-worker")
        .version(env!("CARGO_PKG_VERSION"))
        .about("PDF 生成任务 Worker")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径"),
        )
        .arg(
            Arg::new("worker-id")
                .short('w')
                .long("worker-id")
                .value_name("ID")
                .help("Worker ID，缺省时自动生成"),
        )
        .arg(
            Arg::new("coordinator-url")
                .long("coordinator-url")
                .value_name("URL")
                .help("Coordinator 基础地址"),
        )
        .arg(
            Arg::new("max-jobs")
                .short('m')
                .long("max-jobs")
                .value_name("N")
                .value_parser(clap::value_parser!(u32).range(1..))
                .help("上报的最大并发任务数"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式")
                .value_parser(["json", "pretty"]),
        )
        .arg(
            Arg::new("headers-file")
                .long("headers-file")
                .value_name("FILE")
                .help("Coordinator 请求头配置文件 (JSON)"),
        )
        .arg(
            Arg::new("headers-profile")
                .long("headers-profile")
                .value_name("PROFILE")
                .help("请求头配置文件中的 profile 名称"),
        )
        .arg(Arg::new("user-id").long("user-id").value_name("ID"))
        .arg(Arg::new("user-name").long("user-name").value_name("NAME"))
        .arg(Arg::new("roles").long("roles").value_name("ROLES"))
        .arg(Arg::new("tenant-id").long("tenant-id").value_name("ID"))
        .arg(
            Arg::new("print-headers")
                .long("print-headers")
                .action(ArgAction::SetTrue)
                .help("启动时打印生效的 Coordinator 请求头"),
        )
        .arg(
            Arg::new("jobs-file")
                .long("jobs-file")
                .value_name("FILE")
                .help("预加载的任务列表 (JSON 数组)"),
        )
}

fn startup_config(matches: &ArgMatches) -> StartupConfig {
    let string = |name: &str| matches.get_one::<String>(name).cloned();

    StartupConfig {
        config_path: string("config"),
        log_level: string("log-level"),
        log_format: string("log-format"),
        worker_id: string("worker-id"),
        coordinator_url: string("coordinator-url"),
        max_jobs: matches.get_one::<u32>("max-jobs").copied(),
        headers_file: string("headers-file"),
        headers_profile: string("headers-profile"),
        header_overrides: HeaderOverrides {
            user_id: string("user-id"),
            user_name: string("user-name"),
            roles: string("roles"),
            tenant_id: string("tenant-id"),
        },
        print_headers: matches.get_flag("print-headers"),
        jobs_file: string("jobs-file"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    start_application(startup_config(&matches)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn test_startup_config_from_flags() {
        let matches = cli().get_matches_from([
            "pdfgen-worker",
            "-c",
            "worker.toml",
            "-w",
            "pdf-worker-cli",
            "-m",
            "4",
            "--coordinator-url",
            "http://coordinator/api/v1/jobs",
            "--tenant-id",
            "t1",
            "--print-headers",
        ]);
        let config = startup_config(&matches);

        assert_eq!(config.config_path.as_deref(), Some("worker.toml"));
        assert_eq!(config.worker_id.as_deref(), Some("pdf-worker-cli"));
        assert_eq!(config.max_jobs, Some(4));
        assert_eq!(
            config.coordinator_url.as_deref(),
            Some("http://coordinator/api/v1/jobs")
        );
        assert_eq!(config.header_overrides.tenant_id.as_deref(), Some("t1"));
        assert!(config.header_overrides.user_id.is_none());
        assert!(config.print_headers);
        assert!(config.jobs_file.is_none());
    }

    #[test]
    fn test_max_jobs_must_be_positive() {
        assert!(cli()
            .try_get_matches_from(["pdfgen-worker", "--max-jobs", "0"])
            .is_err());
    }
}
