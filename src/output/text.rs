//! Plain-text duplicate listing.
//!
//! Each group becomes a header line, one bulleted line per member and a
//! blank separator:
//!
//! ```text
//! Duplicate files:
//! • foo.txt
//! • bar.txt
//!
//! ```

use std::io::{self, Write};

use yansi::Paint;

use crate::duplicates::DuplicateGroup;

/// Header printed above every group.
pub const GROUP_HEADER: &str = "Duplicate files:";
/// Prefix of every member line.
pub const BULLET: &str = "•";

/// Human-readable reporter.
#[derive(Debug, Clone, Copy)]
pub struct TextOutput<'a> {
    groups: &'a [DuplicateGroup],
    show_paths: bool,
    color: bool,
}

impl<'a> TextOutput<'a> {
    /// Reporter listing display names without color.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup]) -> Self {
        Self {
            groups,
            show_paths: false,
            color: false,
        }
    }

    /// List full paths instead of base names.
    #[must_use]
    pub fn with_paths(mut self, show_paths: bool) -> Self {
        self.show_paths = show_paths;
        self
    }

    /// Bold the group headers.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Write every group to `writer`.
    ///
    /// # Errors
    ///
    /// Propagates any write failure.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for group in self.groups {
            if self.color {
                writeln!(writer, "{}", GROUP_HEADER.bold())?;
            } else {
                writeln!(writer, "{GROUP_HEADER}")?;
            }
            for file in &group.files {
                if self.show_paths {
                    writeln!(writer, "{BULLET} {}", file.path.to_string_lossy())?;
                } else {
                    writeln!(writer, "{BULLET} {}", file.name)?;
                }
            }
            writeln!(writer)?;
        }
        writer.flush()
    }
}
