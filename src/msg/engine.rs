//! Engine for Outlook `.msg` files.
//!
//! Fields are resolved lazily from the container and cached on first
//! access. Sender, recipients, cc and date come from the embedded transport
//! headers (tag `007D`) when they carry the field, otherwise from the
//! matching property streams. Subject and body are always property streams.

use std::fs::File;
use std::path::Path;

use tracing::{debug, warn};

use super::attachment;
use super::container::{CfbContainer, Container};
use super::property::{
    BODY, DISPLAY_CC, DISPLAY_TO, SENDER_EMAIL, SENDER_NAME, SUBJECT, TRANSPORT_HEADERS,
};
use super::stream::{StreamName, StreamResolver};
use crate::config::ExtractConfig;
use crate::engine::MessageSource;
use crate::error::Result;
use crate::model::address::{split_address_list, split_display_list, EmailAddress};
use crate::model::attachment::AttachmentEntry;
use crate::model::message::NormalizedMessage;
use crate::parser::body::normalize_body;
use crate::parser::header::{self, TransportHeaders};

/// Progress of one engine instance. Never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EngineState {
    /// Container attached, nothing resolved yet.
    Opened,
    /// Every field has been resolved and cached.
    Extracted,
    /// The normalized record has been emitted.
    Serialized,
}

/// A per-field cache slot.
#[derive(Debug, Clone)]
enum Cached<T> {
    Pending,
    Ready(T),
}

impl<T> Cached<T> {
    fn ready(&self) -> Option<&T> {
        match self {
            Self::Pending => None,
            Self::Ready(value) => Some(value),
        }
    }

    fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Extracted view of one MSG container.
pub struct MsgEngine<C> {
    resolver: StreamResolver<C>,
    options: ExtractConfig,
    state: EngineState,
    header: Cached<Option<TransportHeaders>>,
    sender: Cached<Option<String>>,
    recipients: Cached<Vec<String>>,
    cc: Cached<Vec<String>>,
    subject: Cached<Option<String>>,
    date: Cached<Option<String>>,
    body: Cached<Option<String>>,
    attachments: Cached<Vec<AttachmentEntry>>,
}

impl MsgEngine<CfbContainer<File>> {
    /// Open a `.msg` file from disk.
    pub fn open(path: impl AsRef<Path>, options: &ExtractConfig) -> Result<Self> {
        let container = CfbContainer::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "Opened MSG container");
        Ok(Self::new(container, options))
    }
}

impl<C: Container> MsgEngine<C> {
    /// Bind an engine to an already opened container.
    pub fn new(container: C, options: &ExtractConfig) -> Self {
        Self {
            resolver: StreamResolver::new(container).with_preference(options.prefer),
            options: options.clone(),
            state: EngineState::Opened,
            header: Cached::Pending,
            sender: Cached::Pending,
            recipients: Cached::Pending,
            cc: Cached::Pending,
            subject: Cached::Pending,
            date: Cached::Pending,
            body: Cached::Pending,
            attachments: Cached::Pending,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn container(&self) -> &C {
        self.resolver.container()
    }

    /// Resolve every field. Opened → Extracted.
    pub fn extract(&mut self) -> Result<()> {
        self.sender()?;
        self.recipients()?;
        self.cc()?;
        self.subject()?;
        self.date()?;
        self.body()?;
        self.attachments()?;
        Ok(())
    }

    /// Emit the normalized record. → Serialized.
    ///
    /// Later calls return the same record from the caches.
    pub fn finish(&mut self) -> Result<NormalizedMessage> {
        let record = self.normalize()?;
        self.state = EngineState::Serialized;
        Ok(record)
    }

    /// The parsed transport headers, loaded once.
    ///
    /// A missing or malformed blob is `None`.
    pub fn header(&mut self) -> Result<Option<&TransportHeaders>> {
        if !self.header.is_ready() {
            let parsed = match self.resolver.string(&StreamName::property(TRANSPORT_HEADERS))? {
                None => None,
                Some(text) => match TransportHeaders::parse(&text) {
                    Ok(headers) => {
                        debug!(fields = headers.field_count(), "Parsed transport headers");
                        Some(headers)
                    }
                    Err(e) => {
                        warn!(error = %e, "Ignoring malformed transport headers");
                        None
                    }
                },
            };
            self.header = Cached::Ready(parsed);
        }
        Ok(self.header.ready().and_then(Option::as_ref))
    }

    fn header_field(&mut self, name: &str) -> Result<Option<String>> {
        Ok(self
            .header()?
            .and_then(|h| h.get(name))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from))
    }

    fn property(&mut self, tag: &str) -> Result<Option<String>> {
        self.resolver.string(&StreamName::property(tag))
    }

    fn resolve_sender(&mut self) -> Result<Option<String>> {
        if let Some(from) = self.header_field("from")? {
            return Ok(Some(from));
        }
        let name = self.property(SENDER_NAME)?;
        let email = self.property(SENDER_EMAIL)?;
        let composed = EmailAddress::new(name.as_deref(), email.as_deref());
        Ok((!composed.is_empty()).then(|| composed.display()))
    }

    fn resolve_list(&mut self, field: &str, fallback_tag: &str) -> Result<Vec<String>> {
        if let Some(value) = self.header_field(field)? {
            return Ok(split_address_list(&value));
        }
        Ok(self
            .property(fallback_tag)?
            .map(|raw| split_display_list(&raw, &self.options.display_list_delimiter))
            .unwrap_or_default())
    }

    fn resolve_date(&mut self) -> Result<Option<String>> {
        Ok(self.header_field("date")?.map(|raw| match header::parse_date(&raw) {
            Some(dt) => header::format_short_date(&dt),
            None => {
                debug!(date = %raw, "Keeping unparsable header date");
                raw
            }
        }))
    }

    fn resolve_body(&mut self) -> Result<Option<String>> {
        let mode = self.options.body_decoding;
        Ok(self.property(BODY)?.map(|raw| normalize_body(&raw, mode)))
    }

    fn refresh_state(&mut self) {
        let complete = self.sender.is_ready()
            && self.recipients.is_ready()
            && self.cc.is_ready()
            && self.subject.is_ready()
            && self.date.is_ready()
            && self.body.is_ready()
            && self.attachments.is_ready();
        if complete && self.state == EngineState::Opened {
            self.state = EngineState::Extracted;
        }
    }
}

impl<C: Container> MessageSource for MsgEngine<C> {
    fn sender(&mut self) -> Result<Option<String>> {
        if let Some(v) = self.sender.ready() {
            return Ok(v.clone());
        }
        let value = self.resolve_sender()?;
        self.sender = Cached::Ready(value.clone());
        self.refresh_state();
        Ok(value)
    }

    fn recipients(&mut self) -> Result<Vec<String>> {
        if let Some(v) = self.recipients.ready() {
            return Ok(v.clone());
        }
        let value = self.resolve_list("to", DISPLAY_TO)?;
        self.recipients = Cached::Ready(value.clone());
        self.refresh_state();
        Ok(value)
    }

    fn cc(&mut self) -> Result<Vec<String>> {
        if let Some(v) = self.cc.ready() {
            return Ok(v.clone());
        }
        let value = self.resolve_list("cc", DISPLAY_CC)?;
        self.cc = Cached::Ready(value.clone());
        self.refresh_state();
        Ok(value)
    }

    fn subject(&mut self) -> Result<Option<String>> {
        if let Some(v) = self.subject.ready() {
            return Ok(v.clone());
        }
        let value = self.property(SUBJECT)?;
        self.subject = Cached::Ready(value.clone());
        self.refresh_state();
        Ok(value)
    }

    fn date(&mut self) -> Result<Option<String>> {
        if let Some(v) = self.date.ready() {
            return Ok(v.clone());
        }
        let value = self.resolve_date()?;
        self.date = Cached::Ready(value.clone());
        self.refresh_state();
        Ok(value)
    }

    fn body(&mut self) -> Result<Option<String>> {
        if let Some(v) = self.body.ready() {
            return Ok(v.clone());
        }
        let value = self.resolve_body()?;
        self.body = Cached::Ready(value.clone());
        self.refresh_state();
        Ok(value)
    }

    fn attachments(&mut self) -> Result<&[AttachmentEntry]> {
        if !self.attachments.is_ready() {
            let found = attachment::enumerate(&mut self.resolver)?;
            self.attachments = Cached::Ready(found);
            self.refresh_state();
        }
        Ok(self.attachments.ready().map(Vec::as_slice).unwrap_or_default())
    }
}
