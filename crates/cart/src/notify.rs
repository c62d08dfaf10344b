//! Failure notices shown to the shopper.
//!
//! Notices are fire-and-forget: the cart fires one and moves on, it never
//! waits for or inspects anything the [`Notifier`] does with it.

use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

/// The closed set of failure notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notice {
    /// Requested quantity is above what the stock API reports.
    OutOfStock,
    AddFailed,
    RemoveFailed,
    UpdateFailed,
}

impl Notice {
    /// Message text for this notice in the given locale.
    #[must_use]
    pub const fn message(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Self::OutOfStock, Locale::En) => "requested quantity exceeds stock",
            (Self::AddFailed, Locale::En) => "failed to add product",
            (Self::RemoveFailed, Locale::En) => "failed to remove product",
            (Self::UpdateFailed, Locale::En) => "failed to update product quantity",
            (Self::OutOfStock, Locale::PtBr) => "Quantidade solicitada fora de estoque",
            (Self::AddFailed, Locale::PtBr) => "Erro na adição do produto",
            (Self::RemoveFailed, Locale::PtBr) => "Erro na remoção do produto",
            (Self::UpdateFailed, Locale::PtBr) => "Erro na alteração de quantidade do produto",
        }
    }
}

/// Language used for notice text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    #[default]
    En,
    PtBr,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" => Ok(Self::En),
            "pt" | "pt-br" | "pt_br" => Ok(Self::PtBr),
            other => Err(format!("unsupported locale '{other}' (expected en or pt-BR)")),
        }
    }
}

/// User-facing message channel for failure conditions.
pub trait Notifier: Send + Sync {
    /// Display an error message. Must not block.
    fn error(&self, message: &str);
}

/// Notifier that writes notices to the tracing log.
///
/// Used when no UI is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        tracing::warn!(notice = message, "Cart notice");
    }
}

/// Notifier that keeps every message it receives.
///
/// UIs that render notices on their own schedule drain it with [`take`](Self::take).
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages received so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return all pending messages.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock().unwrap_or_else(PoisonError::into_inner))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_owned());
    }
}
