//! Technology signal detection.
//!
//! A plain substring scan of lower-cased markup against a marker table.
//! Several markers may name the same technology; each technology is reported
//! once, ordered by where its earliest marker first appears.

/// A substring that indicates a technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TechMarker {
    /// Lower-case substring to look for
    pub marker: &'static str,
    /// Name reported when the marker is found
    pub name: &'static str,
}

const fn marker(marker: &'static str, name: &'static str) -> TechMarker {
    TechMarker { marker, name }
}

/// Markers checked by [`detect_technologies`].
pub const TECH_MARKERS: &[TechMarker] = &[
    // Site builders and CMSs
    marker("wp-content", "WordPress"),
    marker("wp-includes", "WordPress"),
    marker("wordpress", "WordPress"),
    marker("cdn.shopify.com", "Shopify"),
    marker("shopify", "Shopify"),
    marker("wixstatic.com", "Wix"),
    marker("wix.com", "Wix"),
    marker("squarespace", "Squarespace"),
    marker("webflow", "Webflow"),
    marker("drupal", "Drupal"),
    marker("joomla", "Joomla"),
    marker("magento", "Magento"),
    marker("bigcommerce", "BigCommerce"),
    marker("ghost.io", "Ghost"),
    marker("hubspot", "HubSpot"),
    marker("hs-scripts.com", "HubSpot"),
    // Frameworks
    marker("__next_data__", "Next.js"),
    marker("/_next/static", "Next.js"),
    marker("___gatsby", "Gatsby"),
    marker("__nuxt", "Nuxt"),
    marker("data-reactroot", "React"),
    marker("react-dom", "React"),
    marker("ng-version", "Angular"),
    marker("data-v-app", "Vue.js"),
    marker("vue.js", "Vue.js"),
    marker("svelte", "Svelte"),
    marker("jquery", "jQuery"),
    marker("bootstrap.min", "Bootstrap"),
    marker("tailwind", "Tailwind CSS"),
    // Analytics and marketing
    marker("googletagmanager.com", "Google Tag Manager"),
    marker("google-analytics.com", "Google Analytics"),
    marker("gtag(", "Google Analytics"),
    marker("connect.facebook.net", "Facebook Pixel"),
    marker("fbq(", "Facebook Pixel"),
    marker("static.hotjar.com", "Hotjar"),
    marker("hotjar", "Hotjar"),
    marker("cdn.segment.com", "Segment"),
    marker("mixpanel", "Mixpanel"),
    marker("plausible.io", "Plausible"),
    marker("clarity.ms", "Microsoft Clarity"),
    marker("munchkin", "Marketo"),
    marker("pardot", "Pardot"),
    marker("mailchimp", "Mailchimp"),
    marker("klaviyo", "Klaviyo"),
    marker("intercom", "Intercom"),
    marker("drift.com", "Drift"),
    marker("zendesk", "Zendesk"),
    marker("salesforce", "Salesforce"),
    // Infrastructure and payments
    marker("js.stripe.com", "Stripe"),
    marker("paypal", "PayPal"),
    marker("cdn-cgi", "Cloudflare"),
    marker("cloudflare", "Cloudflare"),
    marker("recaptcha", "reCAPTCHA"),
];

/// Detect technologies with the default marker table.
pub fn detect_technologies(markup: &str) -> Vec<String> {
    detect_with(markup, TECH_MARKERS)
}

/// Detect technologies with a custom marker table.
pub fn detect_with(markup: &str, markers: &[TechMarker]) -> Vec<String> {
    let haystack = markup.to_lowercase();

    let mut hits: Vec<(usize, usize, &'static str)> = markers
        .iter()
        .enumerate()
        .filter_map(|(order, m)| {
            haystack
                .find(&m.marker.to_lowercase())
                .map(|pos| (pos, order, m.name))
        })
        .collect();
    hits.sort_by_key(|(pos, order, _)| (*pos, *order));

    let mut names: Vec<String> = Vec::new();
    for (_, _, name) in hits {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_case_insensitively() {
        let html = r#"<link href="/WP-CONTENT/themes/x.css"><script src="https://www.googletagmanager.com/gtm.js"></script>"#;
        assert_eq!(
            detect_technologies(html),
            vec!["WordPress", "Google Tag Manager"]
        );
    }

    #[test]
    fn test_duplicates_collapse_to_first_position() {
        let html = "<script src=\"https://js.stripe.com/v3\"></script> wordpress ... wp-content ... wp-includes";
        assert_eq!(detect_technologies(html), vec!["Stripe", "WordPress"]);
    }

    #[test]
    fn test_no_markers_no_signals() {
        assert!(detect_technologies("<html><body>plain</body></html>").is_empty());
        assert!(detect_technologies("").is_empty());
    }

    #[test]
    fn test_custom_table() {
        let table = [marker("acme-widget", "Acme Widgets")];
        assert_eq!(
            detect_with("<div class=\"ACME-WIDGET\"></div> wordpress", &table),
            vec!["Acme Widgets"]
        );
    }
}
