use crate::cursor::Vec3;
use std::fmt::{Display, Write};

/// Text builder for section-based documents.
///
/// Every record writes a header, its lines, then a blank separator line.
pub struct SectionWriter {
    buffer: String,
}

impl SectionWriter {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    pub fn write_raw(&mut self, s: &str) {
        self.buffer.push_str(s);
    }

    pub fn header(&mut self, name: &str) {
        self.buffer.push('[');
        self.buffer.push_str(name);
        self.buffer.push_str("]\n");
    }

    pub fn line(&mut self, s: &str) {
        self.buffer.push_str(s);
        self.buffer.push('\n');
    }

    pub fn field(&mut self, key: &str, value: impl Display) {
        // Writing into a String cannot fail.
        let _ = writeln!(self.buffer, "{} {}", key, value);
    }

    pub fn field_opt(&mut self, key: &str, value: Option<&String>) {
        if let Some(v) = value {
            self.field(key, v);
        }
    }

    pub fn field_nonzero_f32(&mut self, key: &str, value: f32) {
        if value != 0.0 {
            self.field(key, value);
        }
    }

    pub fn field_nonzero_i32(&mut self, key: &str, value: i32) {
        if value != 0 {
            self.field(key, value);
        }
    }

    pub fn end_section(&mut self) {
        self.buffer.push('\n');
    }

    pub fn finish(self) -> String {
        self.buffer
    }
}

impl Default for SectionWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats a vector as `x,y,z`.
pub fn format_vec3(v: &Vec3) -> String {
    format!("{},{},{}", v[0], v[1], v[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_layout() {
        let mut w = SectionWriter::new();
        w.header("suspension_factors");
        w.field_nonzero_f32("ride_height", 0.25);
        w.field_nonzero_f32("max_extension", 0.0);
        w.field_nonzero_i32("max_steering_lock", 30);
        w.field_opt("localise", None);
        w.end_section();
        assert_eq!(
            w.finish(),
            "[suspension_factors]\nride_height 0.25\nmax_steering_lock 30\n\n"
        );
    }

    #[test]
    fn test_format_vec3() {
        assert_eq!(format_vec3(&[1.0, -0.5, 2.25]), "1,-0.5,2.25");
    }
}
