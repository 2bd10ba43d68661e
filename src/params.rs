use thiserror::Error;
use url::Url;

use crate::Cells;
use crate::validate;
use crate::validate::ValidationError;

/// Path of the board event stream, relative to the server origin.
pub const STREAM_PATH: &str = "/api/v1/game";

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Invalid rows: {0}")]
    Rows(ValidationError),

    #[error("Invalid seed: {0}")]
    Seed(ValidationError),

    #[error("Invalid origin: {0}")]
    Origin(#[from] url::ParseError),
}

/// What the server is asked to simulate. Every parameter is optional; the server picks defaults
/// for the ones that are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerParams {
    pub rows: Option<Cells>,
    pub seed: Option<u64>,

    /// Initial board in the server's bitmap text encoding
    pub init_state: Option<String>,
}

impl ViewerParams {
    /// Build parameters from raw attribute strings, as a user would type them.
    pub fn from_attributes(
        rows: Option<&str>,
        seed: Option<&str>,
        init_state: Option<&str>,
    ) -> Result<Self, ParamsError> {
        let rows = rows
            .map(|raw| positive_integer(raw).and_then(to_cells))
            .transpose()
            .map_err(ParamsError::Rows)?;

        let seed = seed
            .map(positive_integer)
            .transpose()
            .map_err(ParamsError::Seed)?;

        Ok(Self {
            rows,
            seed,
            init_state: init_state.map(str::to_string),
        })
    }

    /// The event stream URL on `origin`.
    pub fn connection_url(&self, origin: &str) -> Result<Url, ParamsError> {
        let mut url = Url::parse(origin)?.join(STREAM_PATH)?;

        url.set_query(None);
        url.set_fragment(None);

        if self.seed.is_none() && self.init_state.is_none() && self.rows.is_none() {
            return Ok(url);
        }

        {
            let mut query = url.query_pairs_mut();

            if let Some(seed) = self.seed {
                query.append_pair("seed", &seed.to_string());
            }
            if let Some(init_state) = &self.init_state {
                query.append_pair("init_state", init_state);
            }
            if let Some(rows) = self.rows {
                query.append_pair("rows", &rows.to_string());
            }
        }

        Ok(url)
    }
}

fn positive_integer(raw: &str) -> Result<u64, ValidationError> {
    validate::parse_number(raw).and_then(validate::validate_positive_integer)
}

fn to_cells(n: u64) -> Result<Cells, ValidationError> {
    Cells::try_from(n).map_err(|_| ValidationError::TooLarge {
        val: n,
        max: Cells::MAX as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::ParamsError;
    use super::ViewerParams;

    #[test]
    fn parses_attributes() {
        let params = ViewerParams::from_attributes(Some("20"), Some("7"), Some("AAAA")).unwrap();

        assert_eq!(
            params,
            ViewerParams {
                rows: Some(20),
                seed: Some(7),
                init_state: Some("AAAA".to_string()),
            }
        );
    }

    #[test]
    fn rejects_bad_attributes() {
        assert!(matches!(
            ViewerParams::from_attributes(Some("ten"), None, None),
            Err(ParamsError::Rows(_))
        ));
        assert!(matches!(
            ViewerParams::from_attributes(Some("0"), None, None),
            Err(ParamsError::Rows(_))
        ));
        assert!(matches!(
            ViewerParams::from_attributes(Some("99999999999"), None, None),
            Err(ParamsError::Rows(_))
        ));
        assert!(matches!(
            ViewerParams::from_attributes(None, Some("1.5"), None),
            Err(ParamsError::Seed(_))
        ));
    }

    #[test]
    fn url_without_params() {
        let url = ViewerParams::default()
            .connection_url("http://localhost:7676/index.html?x=1")
            .unwrap();

        assert_eq!(url.as_str(), "http://localhost:7676/api/v1/game");
    }

    #[test]
    fn url_with_params() {
        let params = ViewerParams {
            rows: Some(12),
            seed: Some(3),
            init_state: Some("a+b/c=".to_string()),
        };
        let url = params.connection_url("http://localhost:7676").unwrap();

        assert_eq!(
            url.as_str(),
            "http://localhost:7676/api/v1/game?seed=3&init_state=a%2Bb%2Fc%3D&rows=12"
        );
    }

    #[test]
    fn bad_origin() {
        assert!(matches!(
            ViewerParams::default().connection_url("not a url"),
            Err(ParamsError::Origin(_))
        ));
    }
}
