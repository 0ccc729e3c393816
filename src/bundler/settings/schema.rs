//! JSON schema of the `kodegen.json` configuration file.

use serde_json::{Value, json};

/// Returns the configuration schema (draft 7).
///
/// Unknown keys are allowed and ignored by the loader.
pub fn configuration_schema() -> Value {
    let string_or_list = json!({
        "oneOf": [
            { "type": "string", "minLength": 1 },
            { "type": "array", "items": { "type": "string", "minLength": 1 } }
        ]
    });

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "name": { "type": "string", "minLength": 1 },
            "entrypoint": { "type": "string", "minLength": 1 },
            "box-version": { "type": "string", "pattern": "^[0-9]+\\.[0-9]+\\.[0-9]+" },
            "output": { "type": "string", "minLength": 1 },
            "root": { "type": "string", "minLength": 1 },
            "arch": { "type": "array", "items": { "type": "string", "minLength": 1 } },
            "platform": { "type": "array", "items": { "type": "string", "minLength": 1 } },
            "extensions": { "type": "array", "items": { "type": "string", "minLength": 1 } },
            "libraries": { "type": "string", "minLength": 1 },
            "interpreter": { "type": "string", "minLength": 1 },
            "build": {
                "type": "object",
                "properties": {
                    "files": { "type": "array", "items": { "type": "string", "minLength": 1 } },
                    "directories": { "type": "array", "items": { "type": "string", "minLength": 1 } },
                    "finder": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["directory"],
                            "properties": {
                                "directory": string_or_list,
                                "not-directory": string_or_list,
                                "name": string_or_list,
                                "not-name": string_or_list
                            }
                        }
                    }
                }
            },
            "ini": {
                "type": "object",
                "additionalProperties": { "type": ["string", "number", "boolean"] }
            },
            "targets": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["type"],
                    "properties": {
                        "type": { "type": "string", "minLength": 1 },
                        "arch": { "type": "string", "minLength": 1 },
                        "output": { "type": "string", "minLength": 1 },
                        "stub": { "type": "string", "minLength": 1 }
                    }
                }
            }
        }
    })
}
