use std::{
    io::{Stdout, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{response::IntoResponse, SyncEventsError};

/// CSS class of one rendered block in the HTML fragment.
pub const BLOCK_CLASS: &str = "event";

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// One rendered description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    text: String,
}

impl Block {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Region a poller owns. Each call to `replace` discards whatever the
/// previous call rendered.
pub trait Container {
    fn id(&self) -> &str;

    fn replace(&mut self, blocks: &[Block]) -> Result<(), SyncEventsError>;
}

pub struct TerminalContainer<W = Stdout> {
    id: String,
    out: W,
}

impl TerminalContainer<Stdout> {
    pub fn stdout(id: &str) -> Self {
        Self::new(id, std::io::stdout())
    }
}

impl<W: Write> TerminalContainer<W> {
    pub fn new(id: &str, out: W) -> Self {
        Self {
            id: id.to_string(),
            out,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn frame(&self, blocks: &[Block]) -> String {
        let mut frame = format!("{}# {}\n", CLEAR_SCREEN, self.id);
        for block in blocks {
            frame.push_str("  ");
            frame.push_str(block.text());
            frame.push('\n');
        }
        frame
    }
}

impl<W: Write> Container for TerminalContainer<W> {
    fn id(&self) -> &str {
        &self.id
    }

    fn replace(&mut self, blocks: &[Block]) -> Result<(), SyncEventsError> {
        let frame = self.frame(blocks);
        self.out
            .write_all(frame.as_bytes())
            .into_response("failed to write to terminal")?;
        self.out.flush().into_response("failed to flush terminal")
    }
}

/// Keeps an HTML fragment file in sync with the feed. The file is swapped
/// in with a rename so readers never see a partial write.
pub struct HtmlFileContainer {
    id: String,
    path: PathBuf,
}

impl HtmlFileContainer {
    pub fn new(id: &str, path: &Path) -> Self {
        Self {
            id: id.to_string(),
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn fragment(&self, blocks: &[Block]) -> String {
        let mut html = format!("<div id=\"{}\">\n", escape_html(&self.id));
        for block in blocks {
            html.push_str(&format!(
                "  <div class=\"{}\"><p>{}</p></div>\n",
                BLOCK_CLASS,
                escape_html(block.text())
            ));
        }
        html.push_str("</div>\n");
        html
    }
}

impl Container for HtmlFileContainer {
    fn id(&self) -> &str {
        &self.id
    }

    fn replace(&mut self, blocks: &[Block]) -> Result<(), SyncEventsError> {
        let staging = self.path.with_extension("html.tmp");
        std::fs::write(&staging, self.fragment(blocks))
            .into_response("failed to write html fragment")?;
        std::fs::rename(&staging, &self.path)
            .into_response("failed to replace html fragment")
    }
}

/// Shared in-memory container. Clones observe the same blocks.
#[derive(Clone, Debug, Default)]
pub struct MemoryContainer {
    id: String,
    blocks: Arc<Mutex<Vec<Block>>>,
}

impl MemoryContainer {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            blocks: Arc::default(),
        }
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.lock().iter().map(|b| b.text().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Block>> {
        self.blocks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Container for MemoryContainer {
    fn id(&self) -> &str {
        &self.id
    }

    fn replace(&mut self, blocks: &[Block]) -> Result<(), SyncEventsError> {
        *self.lock() = blocks.to_vec();
        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
