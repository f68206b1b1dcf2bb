use std::{
    env, fs, io,
    net::SocketAddr,
    path::{Path, PathBuf},
    str::FromStr,
    thread,
    time::{Duration, SystemTime},
};
use tokio::net::TcpListener;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

pub struct TracingGuards {
    _file_guard: Option<WorkerGuard>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogRetention {
    pub max_age: Duration,
    pub sweep_every: Duration,
}

impl LogRetention {
    pub fn from_env() -> Option<Self> {
        let days = env_or("LOG_RETENTION_DAYS", 14u64);
        let minutes = env_or("LOG_CLEANUP_INTERVAL_MINUTES", 360u64);
        Self::new(days, minutes)
    }

    pub fn new(days: u64, minutes: u64) -> Option<Self> {
        if days == 0 || minutes == 0 {
            return None;
        }
        Some(Self {
            max_age: Duration::from_secs(days * 24 * 60 * 60),
            sweep_every: Duration::from_secs(minutes * 60),
        })
    }
}

pub fn init_tracing(service_name: &str) -> TracingGuards {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_writer(io::stdout);

    // File output is opt-in; a dashboard usually runs in the foreground.
    let log_root = env::var("LOG_DIR")
        .ok()
        .map(|dir| PathBuf::from(dir).join(service_name))
        .filter(|root| fs::create_dir_all(root).is_ok());

    let appender = log_root
        .as_deref()
        .and_then(|root| file_appender(root, service_name));

    let (Some(log_root), Some(appender)) = (log_root, appender) else {
        let subscriber = Registry::default().with(filter).with(stdout_layer);
        let _ = tracing::subscriber::set_global_default(subscriber);
        return TracingGuards { _file_guard: None };
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let subscriber = Registry::default()
        .with(filter)
        .with(stdout_layer)
        .with(fmt::layer().with_ansi(false).with_writer(writer));
    let _ = tracing::subscriber::set_global_default(subscriber);

    if let Some(retention) = LogRetention::from_env() {
        spawn_log_sweeper(log_root, retention);
    }

    TracingGuards {
        _file_guard: Some(guard),
    }
}

// Creating today's file can fail even when the directory exists; stdout still works then.
fn file_appender(log_root: &Path, service_name: &str) -> Option<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(format!("{service_name}.log"))
        .build(log_root)
        .ok()
}

pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn spawn_log_sweeper(log_root: PathBuf, retention: LogRetention) {
    thread::spawn(move || loop {
        if let Some(cutoff) = SystemTime::now().checked_sub(retention.max_age) {
            let removed = sweep_logs(&log_root, cutoff);
            if removed > 0 {
                tracing::debug!(removed, "pruned expired log files");
            }
        }
        thread::sleep(retention.sweep_every);
    });
}

pub fn sweep_logs(root: &Path, cutoff: SystemTime) -> usize {
    let Ok(entries) = fs::read_dir(root) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            removed += sweep_logs(&path, cutoff);
            continue;
        }
        let expired = fs::metadata(&path)
            .and_then(|metadata| metadata.modified())
            .map(|modified| modified < cutoff)
            .unwrap_or(false);
        if expired && fs::remove_file(&path).is_ok() {
            removed += 1;
        }
    }
    removed
}

pub async fn bind_listener(port: u16) -> io::Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    Ok(listener)
}

pub async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "sigterm handler unavailable");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }

    tracing::info!("shutdown requested");
}
