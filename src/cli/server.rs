use anyhow::{Context, anyhow};
use clap::Parser;
use log::{error, info};
use prometheus::{BasicAuthentication, labels};
use tokio::net::TcpListener;
use tokio::task::spawn_blocking;
use tokio::time::{Duration, sleep};

use crate::cli::SubCommandExtend;
use crate::config::{CatalogOptions, EmbedderOptions};
use crate::embedding::create_embedder;
use crate::{Opts, Recognizer, server};

#[derive(Parser, Debug, Clone)]
pub struct ServerCommand {
    #[command(flatten)]
    pub catalog: CatalogOptions,
    #[command(flatten)]
    pub embedder: EmbedderOptions,
    /// 监听地址
    #[arg(long, default_value = "127.0.0.1:8000")]
    pub addr: String,
    /// prometheus 主动推送地址
    #[arg(long, value_name = "URL")]
    pub prometheus_push: Option<String>,
    /// 自定义 instance 标签值
    #[arg(long, value_name = "NAME")]
    pub prometheus_instance: Option<String>,
    /// prometheus 认证信息，格式为 username:password
    #[arg(long, value_name = "AUTH", value_parser = parse_auth)]
    pub prometheus_auth: Option<(String, String)>,
}

impl SubCommandExtend for ServerCommand {
    async fn run(&self, _opts: &Opts) -> anyhow::Result<()> {
        info!("开始初始化识别服务");

        // 初始化失败不退出，错误会在每个请求中返回
        let recognizer = match create_embedder(&self.embedder) {
            Ok(embedder) => Recognizer::load(&self.catalog, embedder).await,
            Err(e) => Err(e),
        };
        if let Ok(recognizer) = &recognizer {
            info!(
                "识别服务就绪: {} 张参考图片，匹配阈值 {}",
                recognizer.catalog().len(),
                recognizer.threshold()
            );
        }

        // 创建应用状态
        let state = server::AppState::new(recognizer);

        // 创建应用
        let app = server::create_app(state);

        if let Some(url) = self.prometheus_push.clone() {
            let instance = self.prometheus_instance.clone().unwrap_or_else(|| self.addr.clone());
            let auth = self.prometheus_auth.clone();
            tokio::spawn(push_metrics(url, instance, auth));
        }

        // 启动服务器
        info!("服务器启动：http://{}", &self.addr);
        let listener = TcpListener::bind(&self.addr)
            .await
            .with_context(|| format!("failed to bind {}", self.addr))?;
        axum::serve(listener, app).await?;

        info!("服务器已停止");
        Ok(())
    }
}

async fn push_metrics(url: String, instance: String, auth: Option<(String, String)>) {
    loop {
        let metric_families = prometheus::gather();
        let url = url.clone();
        let instance = instance.clone();
        let auth = auth.clone();
        let r = spawn_blocking(move || {
            prometheus::push_metrics(
                "stamp_vision",
                labels! {
                    "instance".to_string() => instance,
                },
                &url,
                metric_families,
                auth.map(|(username, password)| BasicAuthentication { username, password }),
            )
        })
        .await;
        match r {
            Ok(Err(e)) => error!("推送指标失败: {e}"),
            Err(e) => error!("推送指标任务异常: {e}"),
            Ok(Ok(())) => {}
        }
        sleep(Duration::from_secs(30)).await;
    }
}

fn parse_auth(s: &str) -> anyhow::Result<(String, String)> {
    let (username, password) =
        s.split_once(':').ok_or_else(|| anyhow!("认证信息格式应为 username:password"))?;
    Ok((username.to_string(), password.to_string()))
}
