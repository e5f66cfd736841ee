use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("lodestone")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("lodestone")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("arcgis")
                .about(
                    "Scans an ArcGIS REST services directory and exports its server, \
                folder, service, layer and field catalog as a CDGC import bundle.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The services directory root URL, e.g. https://host/arcgis/rest/services")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-l --"limit" <MAX_SERVICES>)
                        .required(false)
                        .help("Stop expanding after this many services have been scanned")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("99999"),
                )
                .arg(
                    arg!(-o --"out" <PATH>)
                        .required(false)
                        .help("Directory to write the CSV tables and zip bundle into")
                        .default_value("./out"),
                )
                .arg(
                    arg!(-a --"allow" <SERVICE_TYPE>)
                        .required(false)
                        .help("Service type to include; repeatable (default: FeatureServer, MapServer)")
                        .action(clap::ArgAction::Append),
                ),
        )
        .subcommand(
            command!("openapi")
                .about(
                    "Reads an OpenAPI/Swagger JSON document and exports its tag, \
                endpoint, method, parameter and response hierarchy as a CDGC import bundle.",
                )
                .arg(
                    arg!([FILE])
                        .required(true)
                        .help("Path to the OpenAPI JSON document")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-l --"limit" <MAX_ENDPOINTS>)
                        .required(false)
                        .help("Stop expanding after this many endpoints have been scanned")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("99999"),
                )
                .arg(
                    arg!(-o --"out" <PATH>)
                        .required(false)
                        .help("Directory to write the CSV tables and zip bundle into")
                        .default_value("./out"),
                ),
        )
}
