//! Exception handling clauses of a method body.

use bitflags::bitflags;

bitflags! {
    /// Kind of an exception handling clause.
    ///
    /// A typed catch clause has no bits set, so compare with `==` or use
    /// [`ExceptionHandler::is_catch`] instead of `contains`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ExceptionHandlerFlags: u16 {
        /// A typed catch clause
        const EXCEPTION = 0x0000;
        /// A filter followed by its handler
        const FILTER = 0x0001;
        /// A finally clause
        const FINALLY = 0x0002;
        /// A fault clause, a finally that only runs on exceptions
        const FAULT = 0x0004;
    }
}

/// One try region and its handler.
///
/// ```text
/// try {            // try_offset .. try_offset + try_length
/// }
/// filter {         // filter_offset .. handler_offset, FILTER clauses only
/// }
/// catch/finally {  // handler_offset .. handler_offset + handler_length
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExceptionHandler {
    /// Kind of the clause
    pub flags: ExceptionHandlerFlags,
    /// Start of the protected region, relative to the first instruction
    pub try_offset: u32,
    /// Length of the protected region in bytes
    pub try_length: u32,
    /// Start of the handler
    pub handler_offset: u32,
    /// Length of the handler in bytes
    pub handler_length: u32,
    /// Token of the caught type, typed catch clauses only
    pub class_token: u32,
    /// Start of the filter block, filter clauses only
    pub filter_offset: u32,
}

impl ExceptionHandler {
    /// Build a clause from its persisted fields; the last field is the class token or the
    /// filter offset depending on `flags`.
    #[must_use]
    pub fn from_raw(
        flags: ExceptionHandlerFlags,
        try_offset: u32,
        try_length: u32,
        handler_offset: u32,
        handler_length: u32,
        class_token_or_filter: u32,
    ) -> Self {
        let mut handler = ExceptionHandler {
            flags,
            try_offset,
            try_length,
            handler_offset,
            handler_length,
            class_token: 0,
            filter_offset: 0,
        };

        if flags.contains(ExceptionHandlerFlags::FILTER) {
            handler.filter_offset = class_token_or_filter;
        } else if flags == ExceptionHandlerFlags::EXCEPTION {
            handler.class_token = class_token_or_filter;
        }
        handler
    }

    /// Returns `true` for a typed catch clause.
    #[must_use]
    pub fn is_catch(&self) -> bool {
        self.flags == ExceptionHandlerFlags::EXCEPTION
    }

    /// Returns `true` for a filter clause.
    #[must_use]
    pub fn is_filter(&self) -> bool {
        self.flags.contains(ExceptionHandlerFlags::FILTER)
    }
}
