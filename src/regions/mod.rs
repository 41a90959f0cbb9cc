//! Gather metadata about all AWS regions.
//!
//! AWS publishes information about each region as public parameters in
//! SSM. This utility walks those parameters, joins each region with an
//! approximate location and prints a record for each of them.
use clap::{App, Arg, ArgMatches, SubCommand};

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use crate::aws;
use crate::cli;
use crate::types::UtilResult;
use crate::walker::{ParameterStore, ParameterWalker};

pub mod locations;

use self::locations::Locations;

/// Root of the public region parameters in SSM.
const REGIONS_PATH: &str = "/aws/service/global-infrastructure/regions";

/// Generates an appropriate `SubCommand` for this module.
pub fn cmd<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("regions")
        .about("Gather metadata about all AWS regions")
        .args(&cli::global_args())
        .args(&[
            Arg::with_name("locations")
                .help("A JSON file mapping region identifiers to coordinates")
                .short("l")
                .long("locations")
                .takes_value(true),
            Arg::with_name("path")
                .help("The parameter path containing all regions")
                .long("path")
                .takes_value(true)
                .default_value(REGIONS_PATH),
        ])
}

/// Executes this subcommand and returns a `UtilResult` to indicate success.
pub async fn exec(args: &ArgMatches<'_>) -> UtilResult<()> {
    let locations = match args.value_of("locations") {
        Some(path) => Locations::from_file(path)?,
        None => Locations::bundled()?,
    };

    // path has a default, so this is always present
    let path = args.value_of("path").unwrap_or(REGIONS_PATH);
    let ssm = aws::ssm()?;

    for region in region_ids(&ssm, path).await? {
        info!("Fetching information for {}...", region);
        let record = region_record(&ssm, path, &region, &locations).await?;
        println!("{}", record);
    }

    Ok(())
}

/// Region metadata joined with an approximate location.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionRecord {
    pub id: String,
    pub long_name: String,
    pub geolocation_country: String,
    pub geolocation_region: String,
    pub partition: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Display for RegionRecord {
    /// Formats a record as a single entry of a region table.
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "\"{}\": {{\"{}\", \"{}\", \"{}\", \"{}\", {}, {}}},",
            self.id,
            self.long_name,
            self.geolocation_country,
            self.geolocation_region,
            self.partition,
            self.latitude,
            self.longitude
        )
    }
}

/// Collects all region identifiers stored beneath the root path.
pub async fn region_ids<S: ParameterStore>(store: &S, path: &str) -> UtilResult<Vec<String>> {
    let parameters = ParameterWalker::new(store, path.to_string())
        .collect()
        .await?;

    Ok(parameters.into_iter().map(|p| p.value).collect())
}

/// Collects the attributes of a region, keyed by the last path segment.
pub async fn region_attributes<S: ParameterStore>(
    store: &S,
    path: &str,
    region: &str,
) -> UtilResult<HashMap<String, String>> {
    let region_path = format!("{}/{}", path.trim_end_matches('/'), region);
    let parameters = ParameterWalker::new(store, region_path)
        .collect()
        .await?;

    let mut attributes = HashMap::new();
    for parameter in parameters {
        let name = parameter.name.rsplit('/').next().unwrap_or_default();
        attributes.insert(name.to_string(), parameter.value);
    }

    Ok(attributes)
}

/// Builds the full record of a region from SSM and the location table.
pub async fn region_record<S: ParameterStore>(
    store: &S,
    path: &str,
    region: &str,
    locations: &Locations,
) -> UtilResult<RegionRecord> {
    let mut attributes = region_attributes(store, path, region).await?;
    let location = locations.get(region)?;

    let mut take = |name: &str| {
        attributes
            .remove(name)
            .ok_or_else(|| format!("Region {} is missing attribute {}", region, name))
    };

    Ok(RegionRecord {
        id: region.to_string(),
        long_name: take("longName")?,
        geolocation_country: take("geolocationCountry")?,
        geolocation_region: take("geolocationRegion")?,
        partition: take("partition")?,
        latitude: location.latitude,
        longitude: location.longitude,
    })
}
