//! Minimal XML-RPC codec.
//!
//! Values map onto `serde_json::Value`. `dateTime.iso8601` and `base64`
//! payloads are kept as their raw strings.

use std::fmt::{Display, Write};

use quick_xml::{escape::escape, events::Event, Reader};
use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};

pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<methodCall>");
    let _ = write!(xml, "<methodName>{}</methodName><params>", escape(method));
    for param in params {
        xml.push_str("<param>");
        encode_value(&mut xml, param);
        xml.push_str("</param>");
    }
    xml.push_str("</params></methodCall>");
    xml
}

fn encode_value(xml: &mut String, value: &Value) {
    xml.push_str("<value>");
    match value {
        Value::Null => xml.push_str("<nil/>"),
        Value::Bool(flag) => {
            let _ = write!(xml, "<boolean>{}</boolean>", u8::from(*flag));
        }
        Value::Number(number) => {
            if let Some(int) = number.as_i64().and_then(|n| i32::try_from(n).ok()) {
                let _ = write!(xml, "<int>{}</int>", int);
            } else if number.is_f64() {
                let _ = write!(xml, "<double>{}</double>", number);
            } else {
                // out of i4 range
                let _ = write!(xml, "<string>{}</string>", number);
            }
        }
        Value::String(text) => {
            let _ = write!(xml, "<string>{}</string>", escape(text.as_str()));
        }
        Value::Array(items) => {
            xml.push_str("<array><data>");
            for item in items {
                encode_value(xml, item);
            }
            xml.push_str("</data></array>");
        }
        Value::Object(members) => {
            xml.push_str("<struct>");
            for (name, member) in members {
                let _ = write!(xml, "<member><name>{}</name>", escape(name.as_str()));
                encode_value(xml, member);
                xml.push_str("</member>");
            }
            xml.push_str("</struct>");
        }
    }
    xml.push_str("</value>");
}

/// Decode a `methodResponse`, turning a `<fault>` into [`Error::Fault`].
pub fn decode_response(xml: &str) -> Result<Value> {
    let root = parse_tree(xml)?;
    if root.name != "methodResponse" {
        return Err(malformed(format!("unexpected <{}>", root.name)));
    }

    if let Some(fault) = root.elements().find(|element| element.name == "fault") {
        let fault = decode_value(fault.child("value")?)?;
        let code = fault
            .get("faultCode")
            .and_then(Value::as_i64)
            .unwrap_or_default();
        let message = fault
            .get("faultString")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(Error::Fault { code, message });
    }

    let param = root.child("params")?.child("param")?;
    decode_value(param.child("value")?)
}

fn decode_value(value: &Element) -> Result<Value> {
    let Some(typed) = value.elements().next() else {
        return Ok(Value::String(value.text()));
    };

    let text = typed.text();
    let value = match typed.name.as_str() {
        "string" | "dateTime.iso8601" | "base64" => Value::String(text),
        "int" | "i4" | "i8" => Value::from(text.trim().parse::<i64>().map_err(malformed)?),
        "double" => {
            let number: f64 = text.trim().parse().map_err(malformed)?;
            Number::from_f64(number).map_or(Value::Null, Value::Number)
        }
        "boolean" => Value::Bool(text.trim() == "1"),
        "nil" => Value::Null,
        "array" => Value::Array(
            typed
                .child("data")?
                .elements()
                .filter(|element| element.name == "value")
                .map(decode_value)
                .collect::<Result<_>>()?,
        ),
        "struct" => {
            let mut members = Map::new();
            for member in typed.elements().filter(|element| element.name == "member") {
                let name = member.child("name")?.text();
                members.insert(name, decode_value(member.child("value")?)?);
            }
            Value::Object(members)
        }
        other => return Err(malformed(format!("unknown value type <{}>", other))),
    };
    Ok(value)
}

fn malformed(error: impl Display) -> Error {
    Error::Malformed(error.to_string())
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    children: Vec<Node>,
}

#[derive(Debug)]
enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    fn named(name: &[u8]) -> Result<Self> {
        let name = std::str::from_utf8(name).map_err(malformed)?;
        Ok(Self {
            name: name.to_string(),
            children: vec![],
        })
    }

    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    fn child(&self, name: &str) -> Result<&Element> {
        self.elements()
            .find(|element| element.name == name)
            .ok_or_else(|| malformed(format!("missing <{}> in <{}>", name, self.name)))
    }

    fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }
}

fn parse_tree(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    // bottom of the stack collects the document element
    let mut stack = vec![Element::default()];

    loop {
        let node = match reader.read_event().map_err(malformed)? {
            Event::Start(start) => {
                stack.push(Element::named(start.name().as_ref())?);
                continue;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| malformed("unbalanced document"))?;
                Node::Element(element)
            }
            Event::Empty(empty) => Node::Element(Element::named(empty.name().as_ref())?),
            Event::Text(text) => Node::Text(text.unescape().map_err(malformed)?.into_owned()),
            Event::CData(data) => Node::Text(
                String::from_utf8(data.into_inner().into_owned()).map_err(malformed)?,
            ),
            Event::Eof => break,
            _ => continue,
        };

        stack
            .last_mut()
            .ok_or_else(|| malformed("unbalanced document"))?
            .children
            .push(node);
    }

    let mut document = stack.pop().ok_or_else(|| malformed("unbalanced document"))?;
    if !stack.is_empty() {
        return Err(malformed("unclosed element"));
    }

    let root = document
        .children
        .drain(..)
        .find_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
        .ok_or_else(|| malformed("empty document"));
    root
}
