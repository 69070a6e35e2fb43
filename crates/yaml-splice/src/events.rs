//! One-event lookahead over the engine's parser
//!
//! Tag dispatch needs to read the next event's tag without consuming it, so
//! a registered compositor can still take over and consume the event itself.
//! The engine parser only produces events forward; this wrapper adds the
//! single event of lookahead composition needs.

use crate::error::{LoadError, LoadResult};
use libyaml_safer::{Event, Parser};
use std::io::BufRead;

pub(crate) struct EventSource<'src> {
    parser: Parser<Box<dyn BufRead + 'src>>,
    lookahead: Option<Event>,
    /// Label used in error messages: a file path or `<string>`
    origin: String,
}

impl<'src> EventSource<'src> {
    pub(crate) fn new(reader: Box<dyn BufRead + 'src>, origin: String) -> Self {
        let mut parser = Parser::new();
        parser.set_input(reader);
        EventSource {
            parser,
            lookahead: None,
            origin,
        }
    }

    pub(crate) fn origin(&self) -> &str {
        &self.origin
    }

    /// Read the next event without consuming it.
    pub(crate) fn peek(&mut self) -> LoadResult<&Event> {
        if self.lookahead.is_none() {
            let event = self.pull()?;
            self.lookahead = Some(event);
        }
        match &self.lookahead {
            Some(event) => Ok(event),
            None => unreachable!("lookahead was just filled"),
        }
    }

    /// Consume and return the next event.
    pub(crate) fn next(&mut self) -> LoadResult<Event> {
        match self.lookahead.take() {
            Some(event) => Ok(event),
            None => self.pull(),
        }
    }

    fn pull(&mut self) -> LoadResult<Event> {
        self.parser.parse().map_err(|source| LoadError::Parse {
            origin: self.origin.clone(),
            source,
        })
    }
}
