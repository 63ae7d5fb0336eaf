//! Translation of configuration sections into a runnable scenario
//!
//! Recognised sections (all names upper-case):
//!
//! | Section       | Values                          | Default              |
//! |---------------|---------------------------------|----------------------|
//! | `NORTHSOUTH`  | min, max                        | required             |
//! | `WESTEAST`    | min, max                        | required             |
//! | `TOPALTITUDE` | altitude                        | 2000                 |
//! | `RESOLUTION`  | dx, dy, dz                      | 1000, 1000, 100      |
//! | `WIND`        | u, v, w                         | 1.0, 0.0, 0.1        |
//! | `DIFFUSION`   | D                               | 0.1                  |
//! | `TOPBOUNDARY` | 0 = closed, anything else open  | open                 |
//! | `TIME`        | step count, step duration       | 24, 1.0              |
//! | `ROADS`       | groups of ns0, we0, ns1, we1    | none                 |
//! | `EMISSION`    | 1 constant rate or 24 hourly    | rush-hour profile    |
//!
//! Unknown sections are ignored.

use super::sections::{ConfigValue, SectionMap};
use crate::core_types::GroundPoint;
use crate::emission::{ConstantRate, EmissionProfile, HourlyTable, RushHourProfile};
use crate::error::TransportError;
use crate::grid::{DomainBounds, GridResolution};
use crate::simulation::{ModelConfig, TransportModel};
use crate::solver::{TopBoundary, TransportParams};
use crate::source::{LineSource, RoadNetwork};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Straight road segment between two `(north_south, west_east)` points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadSpec {
    pub start: (f64, f64),
    pub end: (f64, f64),
    #[serde(default)]
    pub name: Option<String>,
}

/// Emission profile shared by every road of a scenario
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum EmissionSpec {
    #[default]
    RushHour,
    Constant(f64),
    Hourly(Vec<f64>),
}

impl EmissionSpec {
    /// # Errors
    ///
    /// Returns [`TransportError::Configuration`] if an hourly table does not
    /// hold 24 rates.
    pub fn to_profile(&self) -> Result<Arc<dyn EmissionProfile>, TransportError> {
        Ok(match self {
            EmissionSpec::RushHour => Arc::new(RushHourProfile::default()),
            EmissionSpec::Constant(rate) => Arc::new(ConstantRate(*rate)),
            EmissionSpec::Hourly(rates) => Arc::new(
                HourlyTable::from_slice(rates)
                    .map_err(|e| TransportError::configuration(e.to_string()))?,
            ),
        })
    }
}

/// Model configuration, roads and run length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub model: ModelConfig,
    pub roads: Vec<RoadSpec>,
    pub emission: EmissionSpec,
    /// Number of steps to run
    pub steps: usize,
    /// Duration of one step (hours)
    pub dt: f64,
}

impl ScenarioConfig {
    /// Salt Lake valley test case: three interstates crossing a
    /// 16.9 km x 20 km domain, one day in hourly steps
    pub fn salt_lake_valley() -> Self {
        let road = |start, end, name: &str| RoadSpec {
            start,
            end,
            name: Some(name.to_string()),
        };
        Self {
            model: ModelConfig::new(DomainBounds::new((0.0, 16900.0), (0.0, 20000.0))),
            roads: vec![
                road((0.0, 10000.0), (16900.0, 10000.0), "I-15"),
                road((5000.0, 18000.0), (15000.0, 18000.0), "I-215"),
                road((8000.0, 0.0), (8000.0, 20000.0), "I-80"),
            ],
            emission: EmissionSpec::RushHour,
            steps: 24,
            dt: 1.0,
        }
    }

    /// Translate parsed sections, filling defaults for optional ones
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Configuration`] if a required section is
    /// missing, a section holds the wrong number of values, or the step count
    /// is not a non-negative integer.
    pub fn from_sections(sections: &SectionMap) -> Result<Self, TransportError> {
        let north_south = required(sections, "NORTHSOUTH", 2)?;
        let west_east = required(sections, "WESTEAST", 2)?;

        let mut bounds = DomainBounds::new(
            (north_south[0], north_south[1]),
            (west_east[0], west_east[1]),
        );
        if let Some(top) = optional(sections, "TOPALTITUDE", 1)? {
            bounds.top_altitude = top[0];
        }

        let mut resolution = GridResolution::default();
        if let Some(r) = optional(sections, "RESOLUTION", 3)? {
            resolution = GridResolution {
                dx: r[0],
                dy: r[1],
                dz: r[2],
            };
        }

        let mut params = TransportParams::default();
        if let Some(wind) = optional(sections, "WIND", 3)? {
            (params.u, params.v, params.w) = (wind[0], wind[1], wind[2]);
        }
        if let Some(d) = optional(sections, "DIFFUSION", 1)? {
            params.diffusion = d[0];
        }
        if let Some(flag) = optional(sections, "TOPBOUNDARY", 1)? {
            params.top_boundary = if flag[0] == 0.0 {
                TopBoundary::Closed
            } else {
                TopBoundary::Open
            };
        }

        let (steps, dt) = match sections.get("TIME") {
            None => (24, 1.0),
            Some([count, duration]) => (step_count(*count)?, duration.as_f64()),
            Some(values) => return Err(wrong_count("TIME", 2, values.len())),
        };

        let roads = match sections.get("ROADS") {
            None => Vec::new(),
            Some(values) => {
                if values.len() % 4 != 0 {
                    return Err(TransportError::configuration(format!(
                        "ROADS needs groups of 4 values, got {}",
                        values.len()
                    )));
                }
                values
                    .chunks_exact(4)
                    .map(|g| RoadSpec {
                        start: (g[0].as_f64(), g[1].as_f64()),
                        end: (g[2].as_f64(), g[3].as_f64()),
                        name: None,
                    })
                    .collect()
            }
        };

        let emission = match sections.get("EMISSION").map(floats) {
            None => EmissionSpec::RushHour,
            Some(rates) if rates.len() == 1 => EmissionSpec::Constant(rates[0]),
            Some(rates) if rates.len() == 24 => EmissionSpec::Hourly(rates),
            Some(rates) => {
                return Err(TransportError::configuration(format!(
                    "EMISSION needs 1 or 24 values, got {}",
                    rates.len()
                )))
            }
        };

        Ok(Self {
            model: ModelConfig {
                bounds,
                resolution,
                params,
            },
            roads,
            emission,
            steps,
            dt,
        })
    }

    /// Roads as sources sharing the scenario's emission profile
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Configuration`] if the emission profile is
    /// invalid.
    pub fn road_network(&self) -> Result<RoadNetwork, TransportError> {
        let profile = self.emission.to_profile()?;
        let mut network = RoadNetwork::new();
        for road in &self.roads {
            let mut source = LineSource::with_shared_profile(
                GroundPoint::new(road.start.0, road.start.1),
                GroundPoint::new(road.end.0, road.end.1),
                Arc::clone(&profile),
            );
            if let Some(name) = &road.name {
                source = source.named(name.clone());
            }
            network.push(source);
        }
        Ok(network)
    }

    /// Construct the model and register every road
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Configuration`] if the model configuration,
    /// the emission profile or a road is invalid.
    pub fn build_model(&self) -> Result<TransportModel, TransportError> {
        let mut model = TransportModel::new(self.model)?;
        for source in self.road_network()?.into_roads() {
            model.add_source(source)?;
        }
        info!(
            "Scenario ready: {} roads, {} steps of {}",
            self.roads.len(),
            self.steps,
            self.dt
        );
        Ok(model)
    }
}

fn floats(values: &[ConfigValue]) -> Vec<f64> {
    values.iter().map(|v| v.as_f64()).collect()
}

fn wrong_count(section: &str, expected: usize, got: usize) -> TransportError {
    TransportError::configuration(format!("{section} needs {expected} values, got {got}"))
}

fn optional(
    sections: &SectionMap,
    name: &str,
    expected: usize,
) -> Result<Option<Vec<f64>>, TransportError> {
    match sections.get(name) {
        None => Ok(None),
        Some(values) if values.len() == expected => Ok(Some(floats(values))),
        Some(values) => Err(wrong_count(name, expected, values.len())),
    }
}

fn required(sections: &SectionMap, name: &str, expected: usize) -> Result<Vec<f64>, TransportError> {
    optional(sections, name, expected)?
        .ok_or_else(|| TransportError::configuration(format!("missing section {name}")))
}

fn step_count(value: ConfigValue) -> Result<usize, TransportError> {
    match value {
        ConfigValue::Int(n) => usize::try_from(n).map_err(|_| {
            TransportError::configuration(format!("step count must be non-negative, got {n}"))
        }),
        ConfigValue::Float(v) => Err(TransportError::configuration(format!(
            "step count must be an integer, got {v}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_sections;

    const VALLEY: &str = "\
# NorthSouth
0
16900.0
# WestEast
0
20000.0
# Time
24 steps
1.0 hour each
# TopBoundary
0   closed lid
# Wind
0.5
0.0
0.05
# Roads
0        I-15 start
10000
16900.0
10000
8000     I-80 start
0
8000
20000
# Emission
2.5
";

    #[test]
    fn test_full_translation() {
        let scenario = ScenarioConfig::from_sections(&parse_sections(VALLEY)).unwrap();
        assert_eq!(scenario.model.bounds.north_south, (0.0, 16900.0));
        assert_eq!(scenario.model.bounds.west_east, (0.0, 20000.0));
        assert_eq!(scenario.model.bounds.top_altitude, 2000.0);
        assert_eq!(scenario.model.resolution, GridResolution::default());
        assert_eq!(scenario.model.params.u, 0.5);
        assert_eq!(scenario.model.params.w, 0.05);
        assert_eq!(scenario.model.params.diffusion, 0.1);
        assert_eq!(scenario.model.params.top_boundary, TopBoundary::Closed);
        assert_eq!((scenario.steps, scenario.dt), (24, 1.0));
        assert_eq!(scenario.roads.len(), 2);
        assert_eq!(scenario.roads[1].start, (8000.0, 0.0));
        assert_eq!(scenario.emission, EmissionSpec::Constant(2.5));
    }

    #[test]
    fn test_defaults_for_optional_sections() {
        let sections = parse_sections("#NORTHSOUTH\n0\n1000\n#WESTEAST\n0\n1000\n");
        let scenario = ScenarioConfig::from_sections(&sections).unwrap();
        assert_eq!(scenario.model.params, TransportParams::default());
        assert_eq!(scenario.emission, EmissionSpec::RushHour);
        assert!(scenario.roads.is_empty());
        assert_eq!((scenario.steps, scenario.dt), (24, 1.0));
    }

    #[test]
    fn test_missing_bounds() {
        let err = ScenarioConfig::from_sections(&parse_sections("#WESTEAST\n0\n1\n")).unwrap_err();
        assert_eq!(
            err,
            TransportError::Configuration("missing section NORTHSOUTH".to_string())
        );
    }

    #[test]
    fn test_wrong_value_counts() {
        let base = "#NORTHSOUTH\n0\n1000\n#WESTEAST\n0\n1000\n";
        for extra in [
            "#WIND\n1.0\n",
            "#ROADS\n1\n2\n3\n",
            "#EMISSION\n1.0\n2.0\n",
            "#TIME\n3\n",
            "#TIME\n2.5\n1.0\n",
            "#TIME\n-1\n1.0\n",
        ] {
            let sections = parse_sections(&format!("{base}{extra}"));
            assert!(
                ScenarioConfig::from_sections(&sections).is_err(),
                "accepted {extra:?}"
            );
        }
    }

    #[test]
    fn test_hourly_emission() {
        let mut text = String::from("#NORTHSOUTH\n0\n1000\n#WESTEAST\n0\n1000\n#EMISSION\n");
        for hour in 0..24 {
            text.push_str(&format!("{hour}.0\n"));
        }
        let scenario = ScenarioConfig::from_sections(&parse_sections(&text)).unwrap();
        let profile = scenario.emission.to_profile().unwrap();
        assert_eq!(profile.rate_at(13.5).unwrap(), 13.0);
    }

    #[test]
    fn test_build_valley_model() {
        let scenario = ScenarioConfig::salt_lake_valley();
        let model = scenario.build_model().unwrap();
        let dims = model.dimensions();
        assert_eq!((dims.nx, dims.ny, dims.nz), (17, 21, 21));
        assert_eq!(model.source_count(), 3);

        let names: Vec<_> = model.sources().map(|(s, _)| s.name()).collect();
        assert_eq!(names, vec![Some("I-15"), Some("I-215"), Some("I-80")]);
    }

    #[test]
    fn test_road_network_shares_profile() {
        let scenario = ScenarioConfig::from_sections(&parse_sections(VALLEY)).unwrap();
        let network = scenario.road_network().unwrap();
        assert_eq!(network.len(), 2);
        for road in &network {
            assert_eq!(road.profile().rate_at(5.0).unwrap(), 2.5);
        }

        let extent = network.bounds().unwrap();
        assert_eq!(extent.north_south, (0.0, 16900.0));
        assert_eq!(extent.west_east, (0.0, 20000.0));
    }
}
