// Infrastructure layer: parsers, normalizer rules, file I/O, serde, renderers, eventing
pub mod event_ndjson;
pub mod html_writer;
pub mod netscape_html;
pub mod parser;
pub mod report_render;
pub mod serde_json_adapter;
pub mod source_file;
pub mod tag_stream;
pub mod url_normalizer;
