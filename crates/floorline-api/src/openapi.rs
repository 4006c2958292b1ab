// SPDX-License-Identifier: Apache-2.0

use serde_json::{json, Value};

use crate::ApiErrorCode;

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorEnvelope"}}}
    })
}

fn write_responses(ok_schema: &str) -> Value {
    json!({
        "200": {
            "description": "recorded or already recorded",
            "content": {"application/json": {"schema": {"$ref": format!("#/components/schemas/{ok_schema}")}}}
        },
        "400": error_response("validation failed or malformed JSON"),
        "401": error_response("missing or unknown bearer token"),
        "404": error_response("unit not found"),
        "413": error_response("request body too large"),
        "500": error_response("internal error"),
        "503": error_response("ledger unavailable; retry after the advertised delay")
    })
}

/// OpenAPI 3 document for the v1 surface. Paths and schemas are kept sorted.
#[must_use]
pub fn openapi_v1_spec() -> Value {
    let codes: Vec<&str> = ApiErrorCode::ALL.iter().map(|c| c.as_str()).collect();
    json!({
      "openapi": "3.0.3",
      "info": {"title": "floorline API", "version": "v1"},
      "components": {
        "securitySchemes": {"bearer": {"type": "http", "scheme": "bearer"}},
        "schemas": {
          "ApiError": {
            "type": "object",
            "additionalProperties": false,
            "required": ["code", "message", "details", "request_id"],
            "properties": {
              "code": {"type": "string", "enum": codes},
              "details": {"type": "object"},
              "message": {"type": "string"},
              "request_id": {"type": "string"}
            }
          },
          "BlockerRequest": {
            "type": "object",
            "required": ["unit_id", "stage", "blocker_code", "blocker_minutes"],
            "properties": {
              "blocker_code": {"type": "string", "enum": ["MATERIAL_SHORTAGE", "EQUIPMENT_FAILURE", "QUALITY_ISSUE", "WAITING_FOR_PREVIOUS_STAGE", "OTHER"]},
              "blocker_minutes": {"type": "integer", "minimum": 0},
              "stage": {"$ref": "#/components/schemas/Stage"},
              "ts_device": {"type": "string", "format": "date-time"},
              "unit_id": {"type": "string", "format": "uuid"}
            }
          },
          "BulkIngestRequest": {
            "type": "object",
            "required": ["events"],
            "properties": {"events": {"type": "array", "items": {"$ref": "#/components/schemas/EventRequest"}}}
          },
          "BulkIngestResponse": {
            "type": "object",
            "required": ["success", "inserted", "duplicates", "errors", "results"],
            "properties": {
              "duplicates": {"type": "integer"},
              "errors": {"type": "array", "items": {"type": "object"}},
              "inserted": {"type": "integer"},
              "results": {"type": "array", "items": {"nullable": true, "type": "object"}},
              "success": {"type": "boolean"}
            }
          },
          "ErrorEnvelope": {
            "type": "object",
            "required": ["error"],
            "properties": {"error": {"$ref": "#/components/schemas/ApiError"}}
          },
          "EventRequest": {
            "type": "object",
            "required": ["unit_id", "order_id", "stage", "type", "ts_device"],
            "properties": {
              "annotation_text": {"type": "string"},
              "blocker_code": {"type": "string"},
              "blocker_minutes": {"type": "integer", "minimum": 0},
              "carrier": {"type": "string"},
              "defect_code": {"type": "string"},
              "order_id": {"type": "string", "format": "uuid"},
              "qty_defect": {"type": "integer", "minimum": 0},
              "qty_good": {"type": "integer", "minimum": 0},
              "rework": {"type": "boolean"},
              "stage": {"$ref": "#/components/schemas/Stage"},
              "tracking_number": {"type": "string"},
              "ts_device": {"type": "string", "format": "date-time"},
              "type": {"type": "string", "enum": ["stage_start", "stage_complete", "rework_order_info", "rework_bead_prep", "rework_insert_beads", "rework_pack", "blocker", "shipment_dispatch", "annotation"]},
              "unit_id": {"type": "string", "format": "uuid"},
              "workstation_id": {"type": "string", "format": "uuid"}
            }
          },
          "IngestEventResponse": {
            "type": "object",
            "required": ["success", "event_id", "duplicate"],
            "properties": {
              "duplicate": {"type": "boolean"},
              "event_id": {"type": "string", "format": "uuid"},
              "success": {"type": "boolean"}
            }
          },
          "Stage": {"type": "string", "enum": ["order_info", "bead_prep", "insert_beads", "pack", "ship"]}
        }
      },
      "paths": {
        "/healthz": {"get": {"responses": {"200": {"description": "ok"}}}},
        "/metrics": {"get": {"responses": {"200": {"description": "prometheus counters"}}}},
        "/readyz": {"get": {"responses": {"200": {"description": "ready"}, "503": {"description": "not ready"}}}},
        "/v1/blockers": {
          "post": {
            "security": [{"bearer": []}],
            "requestBody": {"required": true, "content": {"application/json": {"schema": {"$ref": "#/components/schemas/BlockerRequest"}}}},
            "responses": write_responses("IngestEventResponse")
          }
        },
        "/v1/events": {
          "post": {
            "security": [{"bearer": []}],
            "requestBody": {"required": true, "content": {"application/json": {"schema": {"$ref": "#/components/schemas/EventRequest"}}}},
            "responses": write_responses("IngestEventResponse")
          }
        },
        "/v1/events/bulk": {
          "post": {
            "security": [{"bearer": []}],
            "requestBody": {"required": true, "content": {"application/json": {"schema": {"$ref": "#/components/schemas/BulkIngestRequest"}}}},
            "responses": write_responses("BulkIngestResponse")
          }
        },
        "/v1/units/{unit_id}/events": {
          "get": {
            "security": [{"bearer": []}],
            "parameters": [{"name": "unit_id", "in": "path", "required": true, "schema": {"type": "string", "format": "uuid"}}],
            "responses": {
              "200": {"description": "events ordered by device time"},
              "400": error_response("unit id is not a UUID"),
              "401": error_response("missing or unknown bearer token"),
              "404": error_response("unit not found"),
              "503": error_response("ledger unavailable")
            }
          }
        },
        "/v1/version": {"get": {"responses": {"200": {"description": "build and version info"}}}}
      }
    })
}
