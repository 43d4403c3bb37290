//! WebHDFS backend.
//!
//! Talks to the NameNode REST interface (`/webhdfs/v1{path}?op=...`).
//! Redirects are handled by hand so a `CREATE` never follows a redirect
//! without its body:
//!
//! - `OPEN`: follow the 307 to the DataNode
//! - `CREATE`: ask for the DataNode location (`noredirect=true`), then PUT the body there
//! - `LISTSTATUS`, `GETXATTRS`, `SETXATTR`, `REMOVEXATTR`: single request
//!
//! Remote exceptions are mapped onto [`AppError`] so the attribute layer
//! can recognise "already exists" and "nothing to remove".

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use serde::Deserialize;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{HdfsConfig, HttpConfig};
use crate::storage::{DirEntry, FileSystem, Xattr, XattrBackend, XattrFlag};

const REPLACE_REQUIRED: &str = "The REPLACE flag must be specified";
const CREATE_REQUIRED: &str = "The CREATE flag must be specified";
const NO_MATCHING: &str = "No matching attributes found";
const SOME_NOT_FOUND: &str = "At least one of the attributes provided was not found";

#[derive(Debug, Deserialize)]
struct RemoteExceptionEnvelope {
    #[serde(rename = "RemoteException")]
    remote_exception: RemoteException,
}

#[derive(Debug, Deserialize)]
struct RemoteException {
    exception: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct LocationResponse {
    #[serde(rename = "Location")]
    location: String,
}

#[derive(Debug, Deserialize)]
struct ListStatusResponse {
    #[serde(rename = "FileStatuses")]
    file_statuses: FileStatuses,
}

#[derive(Debug, Deserialize)]
struct FileStatuses {
    #[serde(rename = "FileStatus", default)]
    file_status: Vec<FileStatus>,
}

#[derive(Debug, Deserialize)]
struct FileStatus {
    #[serde(rename = "pathSuffix")]
    path_suffix: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct XattrsResponse {
    #[serde(rename = "XAttrs", default)]
    xattrs: Vec<XattrEntry>,
}

#[derive(Debug, Deserialize)]
struct XattrEntry {
    name: String,
    #[serde(default)]
    value: Option<String>,
}

/// WebHDFS client.
#[derive(Debug, Clone)]
pub struct WebHdfs {
    client: Client,
    base: Url,
    user: Option<String>,
}

impl WebHdfs {
    pub fn new(hdfs: &HdfsConfig, http: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&http.user_agent)
            .timeout(Duration::from_secs(http.timeout_secs))
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            client,
            base: Url::parse(&hdfs.url)?,
            user: hdfs.user.clone(),
        })
    }

    fn url(&self, path: &str, op: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.base.clone();
        url.set_path(&format!("/webhdfs/v1/{}", path.trim_start_matches('/')));
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("op", op);
            if let Some(user) = &self.user {
                query.append_pair("user.name", user);
            }
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        url
    }

    /// Pass through 2xx and 3xx responses, map everything else to an error.
    fn check(response: Response, path: &str, attribute: Option<&str>) -> Result<Response> {
        let status = response.status();
        if status.is_success() || status.is_redirection() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let body = response.text().unwrap_or_default();
        Err(remote_error(&url, status.as_u16(), &body, path, attribute))
    }

    fn redirect_location(response: &Response) -> Result<String> {
        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| AppError::decode(format!("redirect from {} without Location", response.url())))
    }
}

/// Translate a WebHDFS error body.
fn remote_error(url: &str, status: u16, body: &str, path: &str, attribute: Option<&str>) -> AppError {
    let Ok(envelope) = serde_json::from_str::<RemoteExceptionEnvelope>(body) else {
        return AppError::Status {
            url: url.to_string(),
            status,
        };
    };
    let RemoteException { exception, message } = envelope.remote_exception;
    let name = attribute.unwrap_or_default().to_string();

    if exception == "FileNotFoundException" {
        AppError::not_found(path)
    } else if message.contains(REPLACE_REQUIRED) {
        AppError::AttributeExists {
            path: path.to_string(),
            name,
        }
    } else if message.contains(NO_MATCHING)
        || message.contains(SOME_NOT_FOUND)
        || message.contains(CREATE_REQUIRED)
    {
        AppError::AttributeMissing {
            path: path.to_string(),
            name,
        }
    } else {
        AppError::Hdfs { exception, message }
    }
}

impl FileSystem for WebHdfs {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let response = self.client.get(self.url(path, "OPEN", &[])).send()?;
        let mut response = Self::check(response, path, None)?;

        if response.status().is_redirection() {
            let location = Self::redirect_location(&response)?;
            response = Self::check(self.client.get(location).send()?, path, None)?;
        }
        Ok(response.bytes()?.to_vec())
    }

    fn write(&self, path: &str, data: &[u8], overwrite: bool) -> Result<()> {
        let overwrite = if overwrite { "true" } else { "false" };
        let url = self.url(
            path,
            "CREATE",
            &[("overwrite", overwrite), ("noredirect", "true")],
        );
        let response = Self::check(self.client.put(url).send()?, path, None)?;

        let location = if response.status().is_redirection() {
            Self::redirect_location(&response)?
        } else {
            response.json::<LocationResponse>()?.location
        };

        let upload = self
            .client
            .put(location)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(data.to_vec())
            .send()?;
        Self::check(upload, path, None)?;
        Ok(())
    }

    fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let response = self.client.get(self.url(path, "LISTSTATUS", &[])).send()?;
        let listing: ListStatusResponse = Self::check(response, path, None)?.json()?;

        Ok(listing
            .file_statuses
            .file_status
            .into_iter()
            .map(|status| match status.kind.as_str() {
                "DIRECTORY" => DirEntry::directory(status.path_suffix),
                _ => DirEntry::file(status.path_suffix),
            })
            .collect())
    }
}

impl XattrBackend for WebHdfs {
    fn get_xattrs(&self, path: &str, names: &[String]) -> Result<Vec<Xattr>> {
        let mut params = vec![("encoding", "text")];
        params.extend(names.iter().map(|n| ("xattr.name", n.as_str())));

        let response = self
            .client
            .get(self.url(path, "GETXATTRS", &params))
            .send()?;
        let joined = names.join(",");
        let xattrs: XattrsResponse = Self::check(response, path, Some(joined.as_str()))?.json()?;

        Ok(xattrs
            .xattrs
            .into_iter()
            .map(|x| Xattr {
                name: x.name,
                value: x.value.unwrap_or_default(),
            })
            .collect())
    }

    fn set_xattr(&self, path: &str, name: &str, value: &str, flag: XattrFlag) -> Result<()> {
        let url = self.url(
            path,
            "SETXATTR",
            &[
                ("xattr.name", name),
                ("xattr.value", value),
                ("flag", flag.as_str()),
            ],
        );
        Self::check(self.client.put(url).send()?, path, Some(name))?;
        Ok(())
    }

    fn remove_xattr(&self, path: &str, name: &str) -> Result<()> {
        let url = self.url(path, "REMOVEXATTR", &[("xattr.name", name)]);
        Self::check(self.client.put(url).send()?, path, Some(name))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(user: Option<&str>) -> WebHdfs {
        let hdfs = HdfsConfig {
            url: "http://hadoop:9870".to_string(),
            user: user.map(str::to_string),
        };
        WebHdfs::new(&hdfs, &HttpConfig::default()).unwrap()
    }

    #[test]
    fn test_url_layout() {
        let url = client(Some("hdfs")).url("/raw/github/x.json", "OPEN", &[]);
        assert_eq!(
            url.as_str(),
            "http://hadoop:9870/webhdfs/v1/raw/github/x.json?op=OPEN&user.name=hdfs"
        );

        let url = client(None).url(
            "/raw/so/q.json",
            "SETXATTR",
            &[("xattr.name", "user.tags"), ("xattr.value", "rust,c++")],
        );
        assert_eq!(
            url.as_str(),
            "http://hadoop:9870/webhdfs/v1/raw/so/q.json?op=SETXATTR&xattr.name=user.tags&xattr.value=rust%2Cc%2B%2B"
        );
    }

    #[test]
    fn test_remote_error_mapping() {
        let body = |exception: &str, message: &str| {
            serde_json::json!({
                "RemoteException": {
                    "exception": exception,
                    "javaClassName": "java.io.IOException",
                    "message": message
                }
            })
            .to_string()
        };

        let err = remote_error("u", 404, &body("FileNotFoundException", "File does not exist: /a"), "/a", None);
        assert!(err.is_not_found());

        let err = remote_error(
            "u",
            403,
            &body("IOException", "XAttr: user.a already exists. The REPLACE flag must be specified."),
            "/a",
            Some("user.a"),
        );
        assert!(matches!(err, AppError::AttributeExists { ref name, .. } if name == "user.a"));

        let err = remote_error(
            "u",
            403,
            &body("IOException", "No matching attributes found for remove operation"),
            "/a",
            Some("user.a"),
        );
        assert!(matches!(err, AppError::AttributeMissing { .. }));

        let err = remote_error("u", 403, &body("AccessControlException", "Permission denied"), "/a", None);
        assert!(matches!(err, AppError::Hdfs { ref exception, .. } if exception == "AccessControlException"));

        let err = remote_error("u", 502, "<html>bad gateway</html>", "/a", None);
        assert!(matches!(err, AppError::Status { status: 502, .. }));
    }
}
