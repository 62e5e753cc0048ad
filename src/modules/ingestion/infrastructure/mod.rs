pub mod csv_stream;

pub use csv_stream::CsvRowStream;
