use anyhow::{anyhow, Context, Result};
use article_styler::{
    apply_highlights, capture_selection, extract_title_or, transform_with, ArticleId, Document,
    DomRange, HighlightAnchor, HighlightColor, NewHighlight, OffsetIndex, RangeBoundary,
    SessionId, StyleOptions,
};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON file overriding the generated chrome (lang, navTitle, toggleLabel, untitled).
    #[arg(long, global = true)]
    options: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Turn a raw article into the styled reader page.
    Style {
        #[arg(long)]
        html_file: PathBuf,

        /// Output path for the styled HTML.
        #[arg(long)]
        out: PathBuf,

        /// Also write the table of contents as JSON.
        #[arg(long)]
        toc_out: Option<PathBuf>,
    },

    /// Print the title the styler would use.
    Title {
        #[arg(long)]
        html_file: PathBuf,
    },

    /// Anchor a batch of stored highlights onto a styled page.
    Annotate {
        #[arg(long)]
        styled_file: PathBuf,

        /// JSON array of `{id, startOffset, endOffset, color?, highlightedText?}`.
        #[arg(long)]
        highlights: PathBuf,

        #[arg(long)]
        out: PathBuf,
    },

    /// Show the highlight a selection between two offsets would be stored as.
    Select {
        #[arg(long)]
        styled_file: PathBuf,

        #[arg(long)]
        start: usize,

        #[arg(long)]
        end: usize,

        /// One of yellow, green, blue, pink, orange.
        #[arg(long, default_value = "yellow")]
        color: HighlightColor,

        #[arg(long, default_value_t = 1)]
        article: ArticleId,

        #[arg(long, default_value = "local")]
        session: String,
    },

    /// List the highlight palette.
    Colors,
}

fn read_file(path: &Path) -> Result<String> {
    let mut text = String::new();
    File::open(path)
        .with_context(|| format!("open {}", path.display()))?
        .read_to_string(&mut text)
        .with_context(|| format!("read {}", path.display()))?;
    Ok(text)
}

fn write_file(path: &Path, text: &str) -> Result<()> {
    File::create(path)
        .with_context(|| format!("create {}", path.display()))?
        .write_all(text.as_bytes())
        .with_context(|| format!("write {}", path.display()))
}

fn load_options(path: Option<&Path>) -> Result<StyleOptions> {
    match path {
        Some(p) => serde_json::from_str(&read_file(p)?)
            .with_context(|| format!("parse options {}", p.display())),
        None => Ok(StyleOptions::default()),
    }
}

fn style(opts: &StyleOptions, html_file: &Path, out: &Path, toc_out: Option<&Path>) -> Result<()> {
    let raw = read_file(html_file)?;
    let styled = transform_with(&raw, opts);
    write_file(out, &styled.styled_html)?;
    if let Some(path) = toc_out {
        let toc = serde_json::to_string_pretty(&styled.toc).context("encode toc")?;
        write_file(path, &toc)?;
    }
    log::info!(
        "styled {:?}: {} toc entries -> {}",
        styled.title,
        styled.toc.len(),
        out.display()
    );
    Ok(())
}

fn annotate(styled_file: &Path, highlights: &Path, out: &Path) -> Result<()> {
    let html = read_file(styled_file)?;
    let list: Vec<HighlightAnchor> = serde_json::from_str(&read_file(highlights)?)
        .with_context(|| format!("parse highlights {}", highlights.display()))?;

    let doc = Document::parse(&html);
    let unanchored = apply_highlights(&list, &doc.article_root());
    write_file(out, &doc.to_html())?;

    log::info!(
        "anchored {} of {} highlights",
        list.len() - unanchored.len(),
        list.len()
    );
    for id in &unanchored {
        println!("{id}");
    }
    Ok(())
}

struct Selection {
    start: usize,
    end: usize,
    color: HighlightColor,
    article: ArticleId,
    session: SessionId,
}

fn select(styled_file: &Path, sel: Selection) -> Result<()> {
    let Selection { start, end, .. } = sel;
    let doc = Document::parse(&read_file(styled_file)?);
    let root = doc.article_root();
    let index = OffsetIndex::build(&root);

    let from = index.resolve_forward(start)?;
    let to = index.resolve(end)?;
    let range = DomRange {
        start: RangeBoundary {
            container: from.node,
            offset: from.offset,
        },
        end: RangeBoundary {
            container: to.node,
            offset: to.offset,
        },
    };
    let captured = capture_selection(&root, &range)
        .map_err(|e| anyhow!("cannot capture {start}..{end}: {e}"))?;
    let new = NewHighlight::from_selection(sel.article, sel.session, captured, sel.color);
    new.validate()?;
    println!(
        "{}",
        serde_json::to_string_pretty(&new).context("encode highlight")?
    );
    Ok(())
}

fn colors() {
    for color in HighlightColor::ALL {
        println!("{}\t{}\t{}", color.as_str(), color.label(), color.background());
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let opts = load_options(args.options.as_deref())?;

    match args.command {
        Command::Style {
            html_file,
            out,
            toc_out,
        } => style(&opts, &html_file, &out, toc_out.as_deref()),
        Command::Title { html_file } => {
            let raw = read_file(&html_file)?;
            println!("{}", extract_title_or(&raw, &opts.untitled));
            Ok(())
        }
        Command::Annotate {
            styled_file,
            highlights,
            out,
        } => annotate(&styled_file, &highlights, &out),
        Command::Select {
            styled_file,
            start,
            end,
            color,
            article,
            session,
        } => select(
            &styled_file,
            Selection {
                start,
                end,
                color,
                article,
                session: SessionId::new(session),
            },
        ),
        Command::Colors => {
            colors();
            Ok(())
        }
    }
}
