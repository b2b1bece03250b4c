pub mod model_parser;
