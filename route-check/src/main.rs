// Copyright 2024 Wladimir Palant
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![doc = include_str!("../README.md")]

use clap::Parser;
use conditioned_routes::{RouteSet, RoutesConf};
use http::Request;
use log::{error, info};
use std::process::ExitCode;

/// Validate route configuration and resolve request URLs against it
#[derive(Debug, Parser)]
struct Opt {
    /// The path to a route configuration file. This command line flag can be specified multiple
    /// times, routes of later files are added after those of earlier files.
    #[clap(short, long, required = true)]
    conf: Vec<String>,
    /// HTTP method to use for the requests
    #[clap(short, long, default_value = "GET")]
    method: String,
    /// Test the configuration and exit. This is useful to validate the configuration before
    /// deploying it.
    #[clap(short, long)]
    test: bool,
    /// Absolute URLs of the requests to resolve, e.g. http://tv.example.com/shows
    urls: Vec<String>,
}

/// Resolves a URL, returns the line to be printed.
fn resolve(routes: &RouteSet<String>, method: &str, url: &str) -> String {
    let request = match Request::builder().method(method).uri(url).body(()) {
        Ok(request) => request,
        Err(err) => {
            error!("Could not build a {method} request for {url:?}: {err}");
            return format!("{url} -> invalid request");
        }
    };

    match routes.recognize(&request) {
        Some(route) => format!("{url} -> {}", route.name),
        None => format!("{url} -> no match"),
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let opt = Opt::parse();

    let routes = match RoutesConf::load_from_files(&opt.conf).and_then(RouteSet::<String>::try_from)
    {
        Ok(routes) => routes,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };
    info!("Loaded {} routes", routes.len());

    if opt.test {
        println!("configuration OK, {} routes", routes.len());
        return ExitCode::SUCCESS;
    }

    for url in &opt.urls {
        println!("{}", resolve(&routes, &opt.method, url));
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    use conditioned_routes::FromYaml;
    use test_log::test;

    fn make_routes() -> RouteSet<String> {
        RoutesConf::from_yaml(
            r#"
                routes:
                -
                    name: tv
                    path: /*
                    conditions:
                        subdomain: tv
                -
                    name: admin
                    path: /admin/*
                    method: POST
            "#,
        )
        .unwrap()
        .try_into()
        .unwrap()
    }

    #[test]
    fn options() {
        let opt = Opt::parse_from([
            "route-check",
            "-c",
            "a.yaml",
            "--conf",
            "b.yaml",
            "-m",
            "POST",
            "http://example.com/",
        ]);
        assert_eq!(opt.conf, vec!["a.yaml".to_owned(), "b.yaml".to_owned()]);
        assert_eq!(opt.method, "POST");
        assert!(!opt.test);
        assert_eq!(opt.urls, vec!["http://example.com/".to_owned()]);

        assert!(Opt::try_parse_from(["route-check", "http://example.com/"]).is_err());
    }

    #[test]
    fn resolving() {
        let routes = make_routes();
        assert_eq!(
            resolve(&routes, "GET", "http://tv.example.com/shows"),
            "http://tv.example.com/shows -> tv"
        );
        assert_eq!(
            resolve(&routes, "POST", "http://www.example.com/admin/users"),
            "http://www.example.com/admin/users -> admin"
        );
        assert_eq!(
            resolve(&routes, "GET", "http://www.example.com/admin/users"),
            "http://www.example.com/admin/users -> no match"
        );
        assert_eq!(
            resolve(&routes, "GET", "http://exa mple.com/"),
            "http://exa mple.com/ -> invalid request"
        );
    }
}
