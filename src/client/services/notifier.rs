//! Transient user notifications ("toasts") raised by the transport layer.

use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn error(message: impl Into<String>) -> Self {
        Self { level: ToastLevel::Error, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: ToastLevel::Success, message: message.into() }
    }

    pub fn emoji(&self) -> &'static str {
        match self.level {
            ToastLevel::Success => "✅",
            ToastLevel::Error => "❌",
            ToastLevel::Info => "ℹ️",
            ToastLevel::Warning => "⚠️",
        }
    }
}

/// Sink for toasts. Implementations must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Writes toasts to the log only.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Error | ToastLevel::Warning => log::warn!("[TOAST] {}", toast.message),
            ToastLevel::Success | ToastLevel::Info => log::info!("[TOAST] {}", toast.message),
        }
    }
}

/// Keeps the most recent toasts for a UI to drain.
#[derive(Debug)]
pub struct ToastQueue {
    capacity: usize,
    toasts: Mutex<VecDeque<Toast>>,
}

impl ToastQueue {
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), toasts: Mutex::new(VecDeque::new()) }
    }

    /// Removes and returns everything queued so far, oldest first.
    pub fn drain(&self) -> Vec<Toast> {
        match self.toasts.lock() {
            Ok(mut q) => q.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        }
    }

    pub fn latest(&self) -> Option<Toast> {
        match self.toasts.lock() {
            Ok(q) => q.back().cloned(),
            Err(poisoned) => poisoned.into_inner().back().cloned(),
        }
    }

    pub fn len(&self) -> usize {
        self.toasts.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, toast: Toast) {
        LogNotifier.notify(toast.clone());
        let mut q = match self.toasts.lock() {
            Ok(q) => q,
            Err(poisoned) => poisoned.into_inner(),
        };
        if q.len() == self.capacity {
            q.pop_front();
        }
        q.push_back(toast);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_keeps_most_recent() {
        let q = ToastQueue::new(2);
        q.notify(Toast::error("one"));
        q.notify(Toast::error("two"));
        q.notify(Toast::success("three"));
        assert_eq!(q.len(), 2);
        assert_eq!(q.latest().unwrap().message, "three");
        let drained: Vec<_> = q.drain().into_iter().map(|t| t.message).collect();
        assert_eq!(drained, vec!["two", "three"]);
        assert!(q.is_empty());
    }
}
