//! Metric descriptors, samples and their text exposition.

use std::fmt::{self, Write};

/// Static metadata for one gauge family.
///
/// Collector output is always a point-in-time reading; the only counter,
/// `digitalocean_errors`, lives in [`ErrorCounter`](crate::ErrorCounter).
#[derive(Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub name: &'static str,
    pub help: &'static str,
    /// Label names, in the order sample values are given.
    pub labels: &'static [&'static str],
}

impl Descriptor {
    pub const fn gauge(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            help,
            labels,
        }
    }
}

/// One value of a family, valid for the scrape that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub descriptor: &'static Descriptor,
    /// Label values matching `descriptor.labels` position by position.
    pub label_values: Vec<String>,
    pub value: f64,
}

impl Sample {
    pub fn new(descriptor: &'static Descriptor, value: f64, label_values: Vec<String>) -> Self {
        debug_assert_eq!(
            descriptor.labels.len(),
            label_values.len(),
            "label values do not match schema of {}",
            descriptor.name
        );

        Self {
            descriptor,
            label_values,
            value,
        }
    }

    /// Sample without labels.
    pub fn unlabeled(descriptor: &'static Descriptor, value: f64) -> Self {
        Self::new(descriptor, value, Vec::new())
    }

    /// Value of the named label, if the descriptor has it.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.descriptor
            .labels
            .iter()
            .position(|l| *l == name)
            .and_then(|i| self.label_values.get(i))
            .map(String::as_str)
    }
}

/// `1.0` for true, `0.0` for false.
pub fn bool_value(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

/// Write the HELP and TYPE header of a family.
pub fn write_header(out: &mut String, descriptor: &Descriptor) -> fmt::Result {
    writeln!(
        out,
        "# HELP {} {}",
        descriptor.name,
        escape_help(descriptor.help)
    )?;
    writeln!(out, "# TYPE {} gauge", descriptor.name)
}

/// Write one sample line.
pub fn write_sample(out: &mut String, sample: &Sample) -> fmt::Result {
    let descriptor = sample.descriptor;
    out.push_str(descriptor.name);

    if !descriptor.labels.is_empty() {
        out.push('{');
        for (i, (name, value)) in descriptor
            .labels
            .iter()
            .zip(&sample.label_values)
            .enumerate()
        {
            if i > 0 {
                out.push(',');
            }
            write!(out, "{}=\"{}\"", name, escape_label_value(value))?;
        }
        out.push('}');
    }

    writeln!(out, " {}", format_value(sample.value))
}

/// Escape special characters in label values.
fn escape_label_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Format a floating point value for the exposition format.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        }
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static UP: Descriptor = Descriptor::gauge("test_up", "Whether it is up", &["id", "name"]);
    static COUNT: Descriptor = Descriptor::gauge("test_count", "Things counted", &[]);

    #[test]
    fn test_write_header() {
        let mut out = String::new();
        write_header(&mut out, &UP).unwrap();
        assert_eq!(
            out,
            "# HELP test_up Whether it is up\n# TYPE test_up gauge\n"
        );
    }

    #[test]
    fn test_write_labeled_sample() {
        let mut out = String::new();
        let sample = Sample::new(&UP, 1.0, vec!["42".to_string(), "web \"01\"".to_string()]);
        write_sample(&mut out, &sample).unwrap();
        assert_eq!(out, "test_up{id=\"42\",name=\"web \\\"01\\\"\"} 1\n");
    }

    #[test]
    fn test_write_unlabeled_sample() {
        let mut out = String::new();
        write_sample(&mut out, &Sample::unlabeled(&COUNT, 3.0)).unwrap();
        assert_eq!(out, "test_count 3\n");
    }

    #[test]
    fn test_sample_label_lookup() {
        let sample = Sample::new(&UP, 0.0, vec!["7".to_string(), "db".to_string()]);
        assert_eq!(sample.label("name"), Some("db"));
        assert_eq!(sample.label("region"), None);
    }

    #[test]
    fn test_escape_label_value() {
        assert_eq!(escape_label_value("simple"), "simple");
        assert_eq!(escape_label_value("with\"quote"), "with\\\"quote");
        assert_eq!(escape_label_value("with\\backslash"), "with\\\\backslash");
        assert_eq!(escape_label_value("with\nnewline"), "with\\nnewline");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(42.0), "42");
        assert_eq!(format_value(3.25), "3.25");
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
        assert_eq!(format_value(1073741824.0), "1073741824");
    }

    #[test]
    fn test_bool_value() {
        assert_eq!(bool_value(true), 1.0);
        assert_eq!(bool_value(false), 0.0);
    }
}
