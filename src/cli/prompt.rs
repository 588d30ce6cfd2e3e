//! Terminal prompts.
//!
//! Reads block, so they run on tokio's blocking pool. The runtime stays free
//! to notice Ctrl-C while the user is typing.

use std::io::{self, BufRead, Write};

use zeroize::Zeroizing;

use crate::error::{LedgerError, Result};

async fn blocking<T, F>(read: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(read).await {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => Err(LedgerError::Cancelled),
        Err(e) => std::panic::resume_unwind(e.into_panic()),
    }
}

pub async fn line(label: &str) -> Result<String> {
    let label = label.to_string();
    blocking(move || {
        print!("{label}: ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;
        Ok(input.trim_end_matches(['\r', '\n']).to_string())
    })
    .await
}

pub async fn password(label: &str) -> Result<Zeroizing<String>> {
    let label = format!("{label}: ");
    blocking(move || Ok(Zeroizing::new(rpassword::prompt_password(label)?))).await
}

pub async fn confirm(question: &str) -> Result<bool> {
    let answer = line(&format!("{question} [y/N]")).await?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "YES" | "Yes"))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_blocking_read_leaves_runtime_free() {
        let slow_read = blocking(|| {
            std::thread::sleep(Duration::from_millis(500));
            Ok(1)
        });
        let first = tokio::select! {
            _ = slow_read => "read",
            _ = tokio::time::sleep(Duration::from_millis(20)) => "timer",
        };
        assert_eq!(first, "timer");
    }

    #[tokio::test]
    async fn test_blocking_read_errors_propagate() {
        let err = blocking::<(), _>(|| Err(LedgerError::validation("bad input")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "bad input");
    }
}
