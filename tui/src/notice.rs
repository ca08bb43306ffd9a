use std::time::Duration;
use std::time::Instant;

use ratatui::style::Stylize;
use ratatui::text::Line;

/// How long a notice stays on screen.
pub(crate) const NOTICE_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NoticeKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Notice {
    text: String,
    kind: NoticeKind,
    expires_at: Instant,
}

/// A single transient status line. A newer notice replaces the current one.
#[derive(Debug, Default)]
pub(crate) struct NoticeLine {
    current: Option<Notice>,
}

impl NoticeLine {
    pub(crate) fn show(&mut self, text: impl Into<String>, kind: NoticeKind, now: Instant) {
        self.current = Some(Notice {
            text: text.into(),
            kind,
            expires_at: now + NOTICE_TTL,
        });
    }

    /// Drop the notice once its time is up. Returns true when something was removed.
    pub(crate) fn expire(&mut self, now: Instant) -> bool {
        if self
            .current
            .as_ref()
            .is_some_and(|notice| notice.expires_at <= now)
        {
            self.current = None;
            return true;
        }
        false
    }

    pub(crate) fn text(&self) -> Option<&str> {
        self.current.as_ref().map(|notice| notice.text.as_str())
    }

    pub(crate) fn kind(&self) -> Option<NoticeKind> {
        self.current.as_ref().map(|notice| notice.kind)
    }

    pub(crate) fn line(&self) -> Line<'static> {
        match &self.current {
            Some(Notice {
                text,
                kind: NoticeKind::Info,
                ..
            }) => Line::from(text.clone().green()),
            Some(Notice {
                text,
                kind: NoticeKind::Error,
                ..
            }) => Line::from(text.clone().red()),
            None => Line::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn notice_expires_after_ttl() {
        let start = Instant::now();
        let mut notice = NoticeLine::default();
        notice.show("Template saved", NoticeKind::Info, start);

        assert!(!notice.expire(start + NOTICE_TTL - Duration::from_millis(1)));
        assert_eq!(notice.text(), Some("Template saved"));
        assert!(notice.expire(start + NOTICE_TTL));
        assert_eq!(notice.text(), None);
        assert!(!notice.expire(start + NOTICE_TTL * 2));
    }

    #[test]
    fn newer_notice_replaces_older() {
        let start = Instant::now();
        let mut notice = NoticeLine::default();
        notice.show("first", NoticeKind::Info, start);
        notice.show("second", NoticeKind::Error, start + Duration::from_secs(3));

        assert!(!notice.expire(start + NOTICE_TTL));
        assert_eq!(notice.text(), Some("second"));
        assert_eq!(notice.kind(), Some(NoticeKind::Error));
    }
}
