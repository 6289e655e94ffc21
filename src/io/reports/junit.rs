//! JUnit XML rendering of a quality gate verdict, and a reader for its counts.

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::core::errors::{Result, SonarGateError};

/// Root element: one suite per verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunitTestSuites {
    /// Suites in document order
    pub suites: Vec<JunitTestSuite>,
}

/// One verdict rendered as a suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunitTestSuite {
    /// Project display name
    pub package: String,
    /// Dashboard URL
    pub name: String,
    /// Condition count
    pub tests: usize,
    /// Conditions with status `ERROR`
    pub errors: usize,
    /// Conditions not `OK`
    pub failures: usize,
    /// Always zero; conditions have no duration
    pub time: u64,
    /// RFC 3339 generation time
    pub timestamp: String,
    /// One case per condition
    pub cases: Vec<JunitTestCase>,
}

/// One condition rendered as a test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunitTestCase {
    /// Metric key
    pub name: String,
    /// Rule description
    pub classname: String,
    /// Always zero
    pub time: u64,
    /// Failure message for conditions that did not pass
    pub failure: Option<String>,
}

impl JunitTestSuites {
    /// Render as an indented XML document
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new("testsuites")))?;

        for suite in &self.suites {
            let tests = suite.tests.to_string();
            let errors = suite.errors.to_string();
            let failures = suite.failures.to_string();
            let time = suite.time.to_string();

            let mut start = BytesStart::new("testsuite");
            start.push_attribute(("package", suite.package.as_str()));
            start.push_attribute(("name", suite.name.as_str()));
            start.push_attribute(("tests", tests.as_str()));
            start.push_attribute(("errors", errors.as_str()));
            start.push_attribute(("failures", failures.as_str()));
            start.push_attribute(("time", time.as_str()));
            start.push_attribute(("timestamp", suite.timestamp.as_str()));
            writer.write_event(Event::Start(start))?;

            for case in &suite.cases {
                write_case(&mut writer, case)?;
            }

            writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

        String::from_utf8(writer.into_inner().into_inner())
            .map_err(|e| SonarGateError::report(format!("JUnit output is not UTF-8: {e}")))
    }
}

fn write_case(writer: &mut Writer<Cursor<Vec<u8>>>, case: &JunitTestCase) -> Result<()> {
    let time = case.time.to_string();
    let mut start = BytesStart::new("testcase");
    start.push_attribute(("name", case.name.as_str()));
    start.push_attribute(("classname", case.classname.as_str()));
    start.push_attribute(("time", time.as_str()));

    match &case.failure {
        Some(message) => {
            writer.write_event(Event::Start(start))?;
            let mut failure = BytesStart::new("failure");
            failure.push_attribute(("message", message.as_str()));
            writer.write_event(Event::Empty(failure))?;
            writer.write_event(Event::End(BytesEnd::new("testcase")))?;
        }
        None => {
            writer.write_event(Event::Empty(start))?;
        }
    }
    Ok(())
}

/// Counts read back from a JUnit document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JunitCounts {
    /// Sum of suite `tests` attributes
    pub tests: usize,
    /// Sum of suite `failures` attributes
    pub failures: usize,
    /// Sum of suite `errors` attributes
    pub errors: usize,
    /// `<testcase>` elements seen
    pub test_cases: usize,
    /// `<failure>` elements seen
    pub failure_elements: usize,
    /// Suite `name` attributes, unescaped
    pub suite_names: Vec<String>,
}

/// Read the suite attributes and element counts of a JUnit document
pub fn parse_junit_counts(xml: &str) -> Result<JunitCounts> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut counts = JunitCounts::default();
    loop {
        match reader.read_event()? {
            Event::Start(tag) | Event::Empty(tag) => match tag.name().as_ref() {
                b"testsuite" => {
                    counts.tests += numeric_attribute(&tag, b"tests")?;
                    counts.failures += numeric_attribute(&tag, b"failures")?;
                    counts.errors += numeric_attribute(&tag, b"errors")?;
                    if let Some(name) = attribute_value(&tag, b"name") {
                        counts.suite_names.push(name);
                    }
                }
                b"testcase" => counts.test_cases += 1,
                b"failure" => counts.failure_elements += 1,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(counts)
}

fn attribute_value(tag: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    tag.attributes()
        .with_checks(false)
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

fn numeric_attribute(tag: &BytesStart<'_>, name: &[u8]) -> Result<usize> {
    match attribute_value(tag, name) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            SonarGateError::report(format!(
                "attribute '{}' is not a count: '{raw}'",
                String::from_utf8_lossy(name)
            ))
        }),
        None => Ok(0),
    }
}
