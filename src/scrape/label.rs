use std::fmt;

const CATEGORY_PREFIX: &str = "CATEGORY";
const PRODUCT_PREFIX: &str = "PRODUCT";

/// Routing tag attached to every request in the frontier
///
/// The category carried by `Category` and `Product` is the top-navigation
/// text the page was reached from. Text tags look like `CATEGORY-Shoes` and
/// `PRODUCT-Shoes`; the seed request carries no tag at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Label {
    /// Shop home page (or any untagged request)
    #[default]
    TopNav,

    /// Category listing page, possibly one of several paginated pages
    Category(String),

    /// Product detail page
    Product(String),
}

impl Label {
    /// Parses a text tag into a label
    ///
    /// Only the first `-` separates the prefix from the category, so category
    /// names containing hyphens survive. Empty or unrecognized tags route to
    /// the top-navigation handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use rex_scraper::Label;
    ///
    /// assert_eq!(Label::parse("CATEGORY-T-Shirts"), Label::Category("T-Shirts".to_string()));
    /// assert_eq!(Label::parse("PRODUCT-Bags"), Label::Product("Bags".to_string()));
    /// assert_eq!(Label::parse(""), Label::TopNav);
    /// ```
    pub fn parse(tag: &str) -> Self {
        match tag.split_once('-') {
            Some((CATEGORY_PREFIX, category)) => Self::Category(category.to_string()),
            Some((PRODUCT_PREFIX, category)) => Self::Product(category.to_string()),
            _ => {
                if !tag.is_empty() {
                    tracing::warn!("Unrecognized label '{}', routing to top navigation", tag);
                }
                Self::TopNav
            }
        }
    }

    /// Category this label carries, if any
    pub fn category(&self) -> Option<&str> {
        match self {
            Self::TopNav => None,
            Self::Category(category) | Self::Product(category) => Some(category),
        }
    }

    /// Text tag as persisted in storage (empty for `TopNav`)
    pub fn to_tag(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TopNav => Ok(()),
            Self::Category(category) => write!(f, "{}-{}", CATEGORY_PREFIX, category),
            Self::Product(category) => write!(f, "{}-{}", PRODUCT_PREFIX, category),
        }
    }
}
