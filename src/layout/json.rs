// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Arguments;

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::layout::Layout;
use crate::layout::format_time;
use crate::record::Entry;

/// A layout that formats log entries as JSON objects.
///
/// Output format:
///
/// ```json
/// {"time":"2024-08-11T22:44:57.172+0800","level":"info","caller":"server/main.rs:53","msg":"listening","port":8080}
/// ```
///
/// Fields are flattened next to the fixed keys, keeping their JSON type where the value is a
/// boolean or a number. Records at or above the stack trace level carry a `stacktrace` key.
#[derive(Default, Debug, Clone)]
pub struct JsonLayout {}

struct KvCollector<'a> {
    kvs: &'a mut Map<String, Value>,
}

impl<'kvs> log::kv::VisitSource<'kvs> for KvCollector<'_> {
    fn visit_pair(
        &mut self,
        key: log::kv::Key<'kvs>,
        value: log::kv::Value<'kvs>,
    ) -> Result<(), log::kv::Error> {
        self.kvs.insert(key.to_string(), to_json(&value));
        Ok(())
    }
}

fn to_json(value: &log::kv::Value) -> Value {
    if let Some(v) = value.to_bool() {
        return Value::Bool(v);
    }
    if let Some(v) = value.to_i64() {
        return Value::from(v);
    }
    if let Some(v) = value.to_u64() {
        return Value::from(v);
    }
    if let Some(v) = value.to_f64() {
        if let Some(n) = serde_json::Number::from_f64(v) {
            return Value::Number(n);
        }
    }
    Value::String(value.to_string())
}

#[derive(Debug, Serialize)]
struct RecordLine<'a> {
    time: String,
    level: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    logger: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    caller: Option<String>,
    #[serde(serialize_with = "serialize_args")]
    msg: &'a Arguments<'a>,
    #[serde(flatten)]
    kvs: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stacktrace: Option<&'a str>,
}

fn serialize_args<S>(args: &Arguments, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(args)
}

impl JsonLayout {
    pub(crate) fn format(&self, entry: &Entry) -> anyhow::Result<Vec<u8>> {
        let mut kvs = Map::new();
        let mut visitor = KvCollector { kvs: &mut kvs };
        entry.key_values().visit(&mut visitor)?;

        let record_line = RecordLine {
            time: format_time(entry.time()),
            level: entry.level_name(),
            logger: entry.logger(),
            caller: entry.caller(),
            msg: entry.message(),
            kvs,
            stacktrace: entry.stacktrace(),
        };

        Ok(serde_json::to_vec(&record_line)?)
    }
}

impl From<JsonLayout> for Layout {
    fn from(layout: JsonLayout) -> Self {
        Layout::Json(layout)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::time::Duration;

    use jiff::Zoned;
    use log::Level;
    use log::Record;
    use log::kv::ToValue;

    use super::*;
    use crate::layout::Seconds;

    #[test]
    fn test_json_line() {
        let elapsed = Seconds(Duration::from_millis(1500));
        let kvs = [
            ("port", 8080.to_value()),
            ("tls", true.to_value()),
            ("elapsed", elapsed.to_value()),
            ("peer", "10.0.0.1".to_value()),
        ];
        let time = Zoned::from_str("2024-08-11T22:44:57.172105+08:00[+08:00]").unwrap();
        let line = JsonLayout::default()
            .format(&Entry::new(
                &Record::builder()
                    .level(Level::Error)
                    .file_static(Some("src/server/main.rs"))
                    .line(Some(53))
                    .key_values(&kvs)
                    .args(format_args!("listening"))
                    .build(),
                time,
                "api",
                Some("frame 0".to_string()),
            ))
            .unwrap();

        let value: Value = serde_json::from_slice(&line).unwrap();
        assert_eq!(value["time"], "2024-08-11T22:44:57.172+0800");
        assert_eq!(value["level"], "error");
        assert_eq!(value["logger"], "api");
        assert_eq!(value["caller"], "server/main.rs:53");
        assert_eq!(value["msg"], "listening");
        assert_eq!(value["port"], 8080);
        assert_eq!(value["tls"], true);
        assert_eq!(value["elapsed"], 1.5);
        assert_eq!(value["peer"], "10.0.0.1");
        assert_eq!(value["stacktrace"], "frame 0");
    }

    #[test]
    fn test_unnamed_logger_omits_key() {
        let time = Zoned::now();
        let line = JsonLayout::default()
            .format(&Entry::new(
                &Record::builder()
                    .level(Level::Info)
                    .args(format_args!("hi"))
                    .build(),
                time,
                "",
                None,
            ))
            .unwrap();

        let value: Value = serde_json::from_slice(&line).unwrap();
        assert!(value.get("logger").is_none());
        assert!(value.get("stacktrace").is_none());
        assert!(value.get("caller").is_none());
    }
}
