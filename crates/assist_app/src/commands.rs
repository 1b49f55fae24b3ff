use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use assist_core::{Cookie, CookieChange, Message, Response, StorageKey};
use assist_engine::{
    decode_html, load_page, ButtonAction, ExtensionConfig, FileStore, KeyValueStore,
    MessageSource, PageDocument, ReqwestFetcher, SiteAdapter,
};
use assist_logging::assist_info;
use serde::Serialize;
use serde_json::Value;

use crate::cli::{Command, PageArgs};
use crate::host::Host;

pub(crate) async fn run(command: Command, config: ExtensionConfig) -> anyhow::Result<()> {
    let store: Arc<dyn KeyValueStore> = Arc::new(
        FileStore::open(&config.storage_path)
            .with_context(|| format!("failed to open store {}", config.storage_path.display()))?,
    );
    let mut host = Host::new(store, &config)?;

    match command {
        Command::Detect(page) => {
            let page = read_page(&page, &config).await?;
            let adapter = SiteAdapter::for_hostname(page.hostname())
                .with_context(|| format!("{} is not a supported job site", page.hostname()))?;
            match adapter.detect_job(&page) {
                Some(job) => print_json(&job)?,
                None => bail!("no job posting found on {}", page.href()),
            }
        }
        Command::Save(page) => {
            let page = read_page(&page, &config).await?;
            let tab = host.open_tab(page)?;
            let reply = host.click(tab, ButtonAction::SaveJob).await?;
            print_reply(reply)?;
        }
        Command::Autofill { page, resume_id } => {
            let page = read_page(&page, &config).await?;
            let tab = host.open_tab(page)?;
            let picker = host.click(tab, ButtonAction::Autofill).await?;
            if !host.take_popup_open() {
                return print_reply(picker);
            }
            let reply = host.popup_autofill(resume_id).await?;
            print_json(&reply)?;
            if let Some(script) = host.tab(tab) {
                assist_info!("Events dispatched on tab {}: {}", tab, script.page().events().len());
            }
        }
        Command::ContextSave(page) => {
            let page = read_page(&page, &config).await?;
            let tab = host.open_tab(page)?;
            let reply = host.context_save(tab).await;
            print_json(&reply)?;
        }
        Command::Jobs => {
            let reply = host.send(MessageSource::Popup, Message::GetTrackedJobs).await;
            print_reply(reply)?;
        }
        Command::ImportResumes { file } => import_resumes(host.store(), &file).await?,
        Command::Cookie {
            name,
            value,
            remove,
        } => {
            let change = CookieChange {
                cookie: Cookie {
                    name,
                    value: value.unwrap_or_default(),
                    domain: config.auth.domain.clone(),
                },
                removed: remove,
            };
            match host.cookie_changed(change).await? {
                Some(flag) => print_json(&serde_json::json!({ "isAuthenticated": flag }))?,
                None => print_json(&Value::Null)?,
            }
        }
        Command::Reset => {
            host.store().clear().await?;
            assist_info!("Cleared {}", config.storage_path.display());
        }
    }
    Ok(())
}

/// Load the page from `--html` when given, else fetch `--page-url`.
async fn read_page(args: &PageArgs, config: &ExtensionConfig) -> anyhow::Result<PageDocument> {
    match &args.html {
        Some(path) => {
            let bytes =
                fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            let decoded = decode_html(&bytes, None)?;
            Ok(PageDocument::parse(&args.page_url, &decoded.html)?)
        }
        None => {
            let fetcher = ReqwestFetcher::new(config.fetch.clone());
            Ok(load_page(&fetcher, &args.page_url).await?)
        }
    }
}

pub(crate) async fn import_resumes(store: &dyn KeyValueStore, file: &Path) -> anyhow::Result<()> {
    let content =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let resumes: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;
    let Some(count) = resumes.as_array().map(Vec::len) else {
        bail!("{} must contain a JSON array of resumes", file.display());
    };
    store.set(StorageKey::Resumes, resumes).await?;
    assist_info!("Imported {} resume(s)", count);
    Ok(())
}

fn print_reply(reply: Option<Response>) -> anyhow::Result<()> {
    match reply {
        Some(reply) => print_json(&reply),
        None => print_json(&Value::Null),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
