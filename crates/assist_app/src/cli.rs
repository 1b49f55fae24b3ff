use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "assist")]
#[command(bin_name = "assist")]
#[command(about = "Job site assistant: detect, save and autofill job postings", long_about = None)]
pub struct AssistCli {
    /// RON config file; `assist.ron` in the working directory when omitted.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct PageArgs {
    /// URL of the job page; also decides which site adapter runs.
    #[arg(long)]
    pub page_url: String,

    /// Read the page from this file instead of fetching `page_url`.
    #[arg(long)]
    pub html: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the job posting detected on a page.
    Detect(PageArgs),
    /// Click "Save Job" on a page.
    Save(PageArgs),
    /// Click "Autofill with Resume" and pick a resume in the popup.
    Autofill {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long)]
        resume_id: Option<String>,
    },
    /// Save the job through the "Save job to tracker" context-menu item.
    ContextSave(PageArgs),
    /// List tracked jobs.
    Jobs,
    /// Replace the stored resumes with a JSON array read from FILE.
    ImportResumes { file: PathBuf },
    /// Feed a change of an auth cookie to the background.
    Cookie {
        #[arg(long)]
        name: String,
        #[arg(long, conflicts_with = "remove")]
        value: Option<String>,
        #[arg(long)]
        remove: bool,
    },
    /// Clear all stored data.
    Reset,
}
