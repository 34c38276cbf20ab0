//! Options the hosted platform is started with for this organisation.

use serde_json::{json, Value};

use crate::config::OrgConfig;

const FROM_ADDRESS: &str = "no-reply@geocirrus.com";
const EMAIL_DOMAIN: &str = "geocirrus.com";
const EMAIL_ENDPOINT: &str = "https://email.ap-southeast-2.amazonaws.com";

/// `customPages` key and template file name.
const CUSTOM_PAGES: [(&str, &str); 7] = [
    ("passwordResetSuccess", "password_reset_success.html"),
    ("verifyEmailSuccess", "verify_email_success.html"),
    ("linkSendSuccess", "link_send_success.html"),
    ("linkSendFail", "link_send_fail.html"),
    ("invalidLink", "invalid_link.html"),
    ("invalidVerificationLink", "invalid_verification_link"),
    ("choosePassword", "choose_password.html"),
];

pub fn manifest(config: &OrgConfig) -> Value {
    let public_base = config.public_base_url();
    let custom_pages: serde_json::Map<String, Value> = CUSTOM_PAGES
        .iter()
        .map(|(key, file)| (key.to_string(), json!(format!("{public_base}/templates/{file}"))))
        .collect();

    json!({
        "databaseURI": config.database_uri(),
        "appId": config.app_id,
        "masterKey": config.master_key,
        "javascriptKey": config.js_key,
        "serverURL": format!("{}/parse", config.base_server_url()),
        "publicServerURL": format!("{public_base}/parse"),
        "appName": config.organisation_name,
        "verifyUserEmails": true,
        "preventLoginWithUnverifiedEmail": true,
        "webhookKey": config.webhook_key,
        "emailAdapter": {
            "module": "parse-server-simple-ses-adapter-with-template",
            "options": {
                "fromAddress": FROM_ADDRESS,
                "apiKey": config.ses_api_key,
                "apiSecret": config.ses_api_secret,
                "domain": EMAIL_DOMAIN,
                "amazon": EMAIL_ENDPOINT,
            }
        },
        "filesAdapter": {
            "module": "parse-server-s3-adapter",
            "options": {
                "bucket": config.bucket_name,
                "region": config.bucket_region,
                "bucketPrefix": format!("{}/", config.organisation_id),
                "directAccess": false,
                "baseUrlDirect": false,
                "signatureVersion": "v4",
            }
        },
        "customPages": custom_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OrgConfig {
        OrgConfig::from_lookup(|key| {
            let value = match key {
                "appId" => Some("app"),
                "masterKey" => Some("mk"),
                "organisationId" => Some("acme"),
                "domainName" => Some("cloud.example.com"),
                "bucketName" => Some("assets"),
                "HTTP_PORT" => Some("1400"),
                _ => None,
            };
            value.map(str::to_string)
        })
        .unwrap()
    }

    #[test]
    fn urls_derive_from_org_and_domain() {
        let m = manifest(&config());
        assert_eq!(m["serverURL"], "http://localhost:1400/acme/parse");
        assert_eq!(m["publicServerURL"], "https://cloud.example.com/acme/parse");
        assert_eq!(
            m["customPages"]["choosePassword"],
            "https://cloud.example.com/acme/templates/choose_password.html"
        );
        assert_eq!(m["customPages"].as_object().unwrap().len(), 7);
    }

    #[test]
    fn adapters_carry_org_settings() {
        let m = manifest(&config());
        assert_eq!(m["filesAdapter"]["options"]["bucket"], "assets");
        assert_eq!(m["filesAdapter"]["options"]["bucketPrefix"], "acme/");
        assert_eq!(m["filesAdapter"]["options"]["region"], "ap-southeast-2");
        assert_eq!(m["emailAdapter"]["options"]["fromAddress"], "no-reply@geocirrus.com");
        assert_eq!(m["databaseURI"], "mongodb://localhost:27017/acme");
        assert_eq!(m["verifyUserEmails"], true);
    }
}
