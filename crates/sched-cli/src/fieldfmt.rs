//! Compact account listing driven by a format string.
//!
//! Directives have the form `%[.width]<char>`:
//!
//! | char | field |
//! |------|-------|
//! | `n` | name |
//! | `d` | description |
//! | `P` | allowed partitions |
//! | `Q` | default QoS |
//! | `q` | allowed QoS list |
//!
//! `%%` is a literal percent sign; all other text is copied as is. The width
//! is a minimum: values are left-aligned and padded with spaces.

use std::fmt::Write as _;

use sched_proto::Account;

use crate::error::CliError;
use crate::units::encode_list;

/// Largest accepted `%.width`.
pub const MAX_FIELD_WIDTH: usize = 1024;

/// Account field selected by a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountField {
    /// `n`
    Name,
    /// `d`
    Description,
    /// `P`
    AllowedPartitions,
    /// `Q`
    DefaultQos,
    /// `q`
    AllowedQosList,
}

impl AccountField {
    fn from_directive(c: char) -> Option<Self> {
        match c {
            'n' => Some(Self::Name),
            'd' => Some(Self::Description),
            'P' => Some(Self::AllowedPartitions),
            'Q' => Some(Self::DefaultQos),
            'q' => Some(Self::AllowedQosList),
            _ => None,
        }
    }

    /// Column title used in the header line.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Name => "NAME",
            Self::Description => "DESCRIPTION",
            Self::AllowedPartitions => "ALLOWED_PARTITION",
            Self::DefaultQos => "DEFAULT_QOS",
            Self::AllowedQosList => "ALLOWED_QOS_LIST",
        }
    }

    fn value(self, account: &Account) -> String {
        match self {
            Self::Name => account.name.clone(),
            Self::Description => account.description.clone(),
            Self::AllowedPartitions => encode_list(&account.allowed_partitions),
            Self::DefaultQos => account.default_qos.clone().unwrap_or_default(),
            Self::AllowedQosList => encode_list(&account.allowed_qos_list),
        }
    }
}

/// A piece of a parsed format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied to the output.
    Literal(String),
    /// A field with an optional minimum width.
    Field {
        /// Field to print.
        field: AccountField,
        /// Minimum width.
        width: Option<usize>,
    },
}

/// A parsed field-format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFormat {
    segments: Vec<Segment>,
}

impl FieldFormat {
    /// Parse a format string.
    ///
    /// # Errors
    ///
    /// Returns a usage error for an unknown directive, a dangling `%`, a `.`
    /// without digits, or a width above [`MAX_FIELD_WIDTH`].
    pub fn parse(format: &str) -> Result<Self, CliError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = format.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }

            if chars.peek() == Some(&'%') {
                chars.next();
                literal.push('%');
                continue;
            }

            let width = if chars.peek() == Some(&'.') {
                chars.next();
                let mut digits = String::new();
                while let Some(d) = chars.next_if(char::is_ascii_digit) {
                    digits.push(d);
                }
                let width = digits
                    .parse::<usize>()
                    .ok()
                    .filter(|w| *w <= MAX_FIELD_WIDTH)
                    .ok_or_else(|| {
                        CliError::Usage(format!("invalid width in format string: {format}"))
                    })?;
                Some(width)
            } else {
                None
            };

            let directive = chars.next().ok_or_else(|| {
                CliError::Usage(format!("format string ends inside a directive: {format}"))
            })?;
            let field = AccountField::from_directive(directive).ok_or_else(|| {
                CliError::Usage(format!("unknown format directive '%{directive}'"))
            })?;

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Field { field, width });
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Parsed segments, in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Render one account.
    #[must_use]
    pub fn render(&self, account: &Account) -> String {
        self.layout(|field| field.value(account))
    }

    /// Render the header line.
    #[must_use]
    pub fn header(&self) -> String {
        self.layout(|field| field.title().to_string())
    }

    fn layout(&self, mut value: impl FnMut(AccountField) -> String) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field { field, width } => {
                    let width = width.unwrap_or(0);
                    // Writing to a String cannot fail.
                    let _ = write!(out, "{:<width$}", value(*field));
                }
            }
        }
        out
    }
}
