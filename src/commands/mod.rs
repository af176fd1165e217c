pub mod check;
pub mod practice;

use std::future::Future;
use std::io::{self, Write};

use crate::loading::with_loading;
use crate::palette::Palette;

/// Awaits `future` with the loading label animating on stderr.
pub(crate) async fn with_cli_loading<F: Future>(future: F) -> F::Output {
    let mut stderr = io::stderr();
    with_loading(future, |frame| {
        let _ = match frame {
            Some(label) => write!(stderr, "\r{}", Palette::dim(label)),
            None => write!(stderr, "\r\x1b[2K"),
        };
        let _ = stderr.flush();
    })
    .await
}
