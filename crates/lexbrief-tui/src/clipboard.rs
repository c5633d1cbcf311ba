use anyhow::{bail, Context, Result};

/// Destination for the copy action.
pub trait ClipboardWriter {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The system clipboard. The handle is kept open after the first copy so
/// the contents survive on X11, where the owning process must stay alive.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl ClipboardWriter for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        if self.inner.is_none() {
            self.inner = Some(arboard::Clipboard::new().context("clipboard unavailable")?);
        }
        match self.inner.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text.to_owned())
                .context("clipboard write failed"),
            None => bail!("clipboard unavailable"),
        }
    }
}
