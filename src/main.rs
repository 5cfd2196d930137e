use std::env;
use std::error::Error;

use corpmatch::{CompanyEntry, CorpmatchConfig, EncodedMatches, Pipeline, SearchParams};

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    let cfg = match args.next() {
        Some(path) => CorpmatchConfig::from_file(path)?,
        None => CorpmatchConfig::default(),
    };
    let name = args.next().unwrap_or_else(|| "Acme Incorporated".to_string());
    let url = args.next().unwrap_or_else(|| "https://www.acme.com".to_string());

    let pipeline = Pipeline::from_config(&cfg)?;
    if pipeline.registry().stats()?.companies == 0 {
        let report = pipeline.ingest(&[
            CompanyEntry::new("Acme, Inc.", "A1").with_url("acme.com"),
            CompanyEntry::new("Acme Widgets LLC", "A2").with_url("acmewidgets.com/shop"),
            CompanyEntry::new("Acne Clinic", "A3"),
            CompanyEntry::new("Globex Corporation", "A4").with_url("www.globex.com"),
        ])?;
        println!("seeded registry: {report:?}");
    }

    let params = SearchParams {
        name: Some(name),
        url: Some(url),
        format: Some("csv".to_string()),
        ..SearchParams::default()
    };
    match pipeline.search(&params)? {
        EncodedMatches::Text(csv) => print!("{csv}"),
        EncodedMatches::Structured(doc) => println!("{}", serde_json::to_string_pretty(&doc)?),
    }

    Ok(())
}
