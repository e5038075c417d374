// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Minimal XML-RPC codec covering the value types supervisord produces.

use crate::error::RemoteFault;
use std::collections::BTreeMap;
use std::fmt::Write;
use xml::escape::escape_str_pcdata;
use xml::reader::{EventReader, XmlEvent};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Double(f64),
    String(String),
    Array(Vec<Value>),
    Struct(BTreeMap<String, Value>),
    Nil,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn member(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members.get(key),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodCall><methodName>");
    out.push_str(&escape_str_pcdata(method));
    out.push_str("</methodName>");
    encode_params(&mut out, params);
    out.push_str("</methodCall>\n");
    out
}

pub fn encode_response(value: &Value) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodResponse>");
    encode_params(&mut out, std::slice::from_ref(value));
    out.push_str("</methodResponse>\n");
    out
}

pub fn encode_fault(code: i64, message: &str) -> String {
    let fault = Value::Struct(BTreeMap::from([
        ("faultCode".to_string(), Value::Int(code)),
        ("faultString".to_string(), Value::from(message)),
    ]));
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodResponse><fault>");
    encode_value(&mut out, &fault);
    out.push_str("</fault></methodResponse>\n");
    out
}

fn encode_params(out: &mut String, params: &[Value]) {
    out.push_str("<params>");
    for param in params {
        out.push_str("<param>");
        encode_value(out, param);
        out.push_str("</param>");
    }
    out.push_str("</params>");
}

fn encode_value(out: &mut String, value: &Value) {
    out.push_str("<value>");
    match value {
        Value::Int(i) => {
            let _ = write!(out, "<int>{i}</int>");
        }
        Value::Bool(b) => {
            let _ = write!(out, "<boolean>{}</boolean>", u8::from(*b));
        }
        Value::Double(d) => {
            let _ = write!(out, "<double>{d}</double>");
        }
        Value::String(s) => {
            let _ = write!(out, "<string>{}</string>", escape_str_pcdata(s));
        }
        Value::Array(values) => {
            out.push_str("<array><data>");
            for v in values {
                encode_value(out, v);
            }
            out.push_str("</data></array>");
        }
        Value::Struct(members) => {
            out.push_str("<struct>");
            for (name, v) in members {
                let _ = write!(out, "<member><name>{}</name>", escape_str_pcdata(name));
                encode_value(out, v);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
        Value::Nil => out.push_str("<nil/>"),
    }
    out.push_str("</value>");
}

/// Decode a `methodResponse`. A `<fault>` becomes [`RemoteFault::Fault`].
pub fn parse_response(body: &[u8]) -> Result<Value, RemoteFault> {
    let root = parse_tree(body)?;
    if root.name != "methodResponse" {
        return Err(RemoteFault::malformed(format!(
            "expected methodResponse, got <{}>",
            root.name
        )));
    }

    if let Some(fault) = root.child("fault") {
        let value = decode_value(fault.required("value")?)?;
        let code = value
            .member("faultCode")
            .and_then(Value::as_i64)
            .ok_or_else(|| RemoteFault::malformed("fault without faultCode"))?;
        let message = value
            .member("faultString")
            .and_then(Value::as_str)
            .unwrap_or_default();
        return Err(RemoteFault::fault(code, message));
    }

    let param = root.required("params")?.required("param")?;
    decode_value(param.required("value")?)
}

/// Decode a `methodCall` into its method name and parameters.
pub fn parse_call(body: &[u8]) -> Result<(String, Vec<Value>), RemoteFault> {
    let root = parse_tree(body)?;
    if root.name != "methodCall" {
        return Err(RemoteFault::malformed(format!(
            "expected methodCall, got <{}>",
            root.name
        )));
    }
    let method = root.required("methodName")?.text.trim().to_string();
    let mut params = Vec::new();
    if let Some(list) = root.child("params") {
        for param in list.children.iter().filter(|c| c.name == "param") {
            params.push(decode_value(param.required("value")?)?);
        }
    }
    Ok((method, params))
}

#[derive(Debug, Default)]
struct Node {
    name: String,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    fn required(&self, name: &str) -> Result<&Node, RemoteFault> {
        self.child(name).ok_or_else(|| {
            RemoteFault::malformed(format!("<{}> is missing <{name}>", self.name))
        })
    }
}

fn parse_tree(body: &[u8]) -> Result<Node, RemoteFault> {
    let mut stack: Vec<Node> = Vec::new();
    let mut root = None;

    for event in EventReader::new(body) {
        match event.map_err(|e| RemoteFault::malformed(e.to_string()))? {
            XmlEvent::StartElement { name, .. } => stack.push(Node {
                name: name.local_name,
                ..Node::default()
            }),
            XmlEvent::EndElement { .. } => {
                let node = stack
                    .pop()
                    .ok_or_else(|| RemoteFault::malformed("unbalanced end element"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }
            XmlEvent::Characters(text) | XmlEvent::CData(text) | XmlEvent::Whitespace(text) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text);
                }
            }
            _ => {}
        }
    }

    root.ok_or_else(|| RemoteFault::malformed("empty document"))
}

fn decode_value(node: &Node) -> Result<Value, RemoteFault> {
    // A <value> without a type element is a string.
    let Some(typed) = node.children.first() else {
        return Ok(Value::String(node.text.clone()));
    };
    let text = typed.text.trim();
    match typed.name.as_str() {
        "int" | "i4" | "i8" => text
            .parse()
            .map(Value::Int)
            .map_err(|_| RemoteFault::malformed(format!("invalid integer {text:?}"))),
        "boolean" => match text {
            "1" => Ok(Value::Bool(true)),
            "0" => Ok(Value::Bool(false)),
            other => Err(RemoteFault::malformed(format!("invalid boolean {other:?}"))),
        },
        "double" => text
            .parse()
            .map(Value::Double)
            .map_err(|_| RemoteFault::malformed(format!("invalid double {text:?}"))),
        "string" => Ok(Value::String(typed.text.clone())),
        "array" => {
            let data = typed.required("data")?;
            data.children
                .iter()
                .filter(|c| c.name == "value")
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        "struct" => {
            let mut members = BTreeMap::new();
            for member in typed.children.iter().filter(|c| c.name == "member") {
                let name = member.required("name")?.text.trim().to_string();
                members.insert(name, decode_value(member.required("value")?)?);
            }
            Ok(Value::Struct(members))
        }
        "nil" => Ok(Value::Nil),
        other => Err(RemoteFault::malformed(format!(
            "unsupported value type <{other}>"
        ))),
    }
}
