//! The resource kinds and the endpoints each one uses.

use std::fmt;
use std::str::FromStr;

/// How the status request changes an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleMode {
    /// Active and inactive flip back and forth.
    Flip,
    /// Open items are resolved once; resolved items stay resolved.
    Resolve,
}

/// Endpoint paths, field names and validation rules for one kind.
#[derive(Debug)]
pub struct EndpointConfig {
    /// Singular noun used in messages ("service")
    pub label: &'static str,
    /// Plural noun used in messages ("services")
    pub plural: &'static str,
    /// Dashboard section key
    pub section: &'static str,
    pub list_path: &'static str,
    /// Field of the list response holding the items
    pub list_field: &'static str,
    pub create_path: Option<&'static str>,
    /// Field of the create response holding the new item, when the server returns it
    pub created_field: Option<&'static str>,
    /// Send `active: true` with new items
    pub create_sends_active: bool,
    pub toggle_path: &'static str,
    /// Name of the id field in the status request
    pub toggle_id_field: &'static str,
    pub toggle_mode: ToggleMode,
    pub update_path: Option<&'static str>,
    pub delete_path: Option<&'static str>,
    /// Text fields of the create form
    pub text_fields: &'static [&'static str],
    /// Record fields read into a form field when the record lacks it, as (form, record)
    pub prefill_aliases: &'static [(&'static str, &'static str)],
    pub required_fields: &'static [&'static str],
    /// Image fields of the create form, in display order
    pub image_slots: &'static [&'static str],
    pub required_images: &'static [&'static str],
    pub missing_fields_message: &'static str,
    pub missing_image_message: &'static str,
}

const MISSING_FIELDS: &str = "Please fill in all required fields.";
const MISSING_PHOTO: &str = "Please upload a photo.";

static SERVICE: EndpointConfig = EndpointConfig {
    label: "service",
    plural: "services",
    section: "ManageServices",
    list_path: "service/get-service",
    list_field: "events",
    create_path: Some("service/add-service"),
    created_field: Some("service"),
    create_sends_active: false,
    toggle_path: "service/change-service-status",
    toggle_id_field: "event_id",
    toggle_mode: ToggleMode::Flip,
    update_path: Some("service/update-service"),
    delete_path: Some("service/delete-service"),
    text_fields: &["name", "description"],
    prefill_aliases: &[("name", "title"), ("description", "status")],
    required_fields: &["name"],
    image_slots: &["photo"],
    required_images: &["photo"],
    missing_fields_message: MISSING_FIELDS,
    missing_image_message: "Please upload a image.",
};

static CLIENT: EndpointConfig = EndpointConfig {
    label: "client",
    plural: "clients",
    section: "ManageClients",
    list_path: "client/get-client",
    list_field: "clients",
    create_path: Some("client/add-client"),
    created_field: Some("client"),
    create_sends_active: true,
    toggle_path: "client/change-client-status",
    toggle_id_field: "event_id",
    toggle_mode: ToggleMode::Flip,
    update_path: None,
    delete_path: None,
    text_fields: &["name"],
    prefill_aliases: &[],
    required_fields: &["name"],
    image_slots: &["photo"],
    required_images: &["photo"],
    missing_fields_message: MISSING_FIELDS,
    missing_image_message: MISSING_PHOTO,
};

static GALLERY: EndpointConfig = EndpointConfig {
    label: "photo",
    plural: "photos",
    section: "GalleryManagement",
    list_path: "gallery/get-photos",
    list_field: "clients",
    create_path: Some("gallery/add-photo"),
    created_field: Some("client"),
    create_sends_active: true,
    toggle_path: "gallery/change-photo-status",
    toggle_id_field: "event_id",
    toggle_mode: ToggleMode::Flip,
    update_path: None,
    delete_path: None,
    text_fields: &["name", "description", "category"],
    prefill_aliases: &[],
    required_fields: &["name"],
    image_slots: &["photo"],
    required_images: &["photo"],
    missing_fields_message: MISSING_FIELDS,
    missing_image_message: MISSING_PHOTO,
};

static BLOG: EndpointConfig = EndpointConfig {
    label: "blog",
    plural: "blogs",
    section: "ManageBlogs",
    list_path: "blogs/get-blogs",
    list_field: "blogs",
    create_path: Some("blogs/add-blog"),
    created_field: Some("blog"),
    create_sends_active: false,
    toggle_path: "blogs/change-blog-status",
    toggle_id_field: "blog_id",
    toggle_mode: ToggleMode::Flip,
    update_path: None,
    delete_path: None,
    text_fields: &[
        "title",
        "description",
        "readTime",
        "date",
        "author",
        "tags",
        "category",
    ],
    prefill_aliases: &[],
    required_fields: &["title", "description"],
    image_slots: &[
        "profile_photo",
        "photo1",
        "photo2",
        "photo3",
        "photo4",
        "photo5",
    ],
    required_images: &["photo1"],
    missing_fields_message: "Please fill in all required fields and upload at least one photo.",
    missing_image_message: "Please fill in all required fields and upload at least one photo.",
};

static TEAM: EndpointConfig = EndpointConfig {
    label: "member",
    plural: "team members",
    section: "TeamManagement",
    list_path: "team/get-all-member",
    list_field: "events",
    create_path: Some("team/add-member"),
    created_field: None,
    create_sends_active: false,
    toggle_path: "team/change-member-status",
    toggle_id_field: "event_id",
    toggle_mode: ToggleMode::Flip,
    update_path: None,
    delete_path: None,
    text_fields: &[
        "name",
        "description",
        "position",
        "facebook_link",
        "instagram_link",
    ],
    prefill_aliases: &[],
    required_fields: &["name", "position"],
    image_slots: &["photo"],
    required_images: &["photo"],
    missing_fields_message: MISSING_FIELDS,
    missing_image_message: MISSING_PHOTO,
};

static ACHIEVEMENT: EndpointConfig = EndpointConfig {
    label: "achievement",
    plural: "achievements",
    section: "AchievementsManagement",
    list_path: "achievements/get-achievements",
    list_field: "events",
    create_path: Some("achievements/add-achievements"),
    created_field: None,
    create_sends_active: false,
    toggle_path: "achievements/change-achievements-status",
    toggle_id_field: "event_id",
    toggle_mode: ToggleMode::Flip,
    update_path: None,
    delete_path: None,
    text_fields: &["title", "description", "achievement_date"],
    prefill_aliases: &[],
    required_fields: &["title"],
    image_slots: &["photo"],
    required_images: &["photo"],
    missing_fields_message: MISSING_FIELDS,
    missing_image_message: MISSING_PHOTO,
};

static CAREER: EndpointConfig = EndpointConfig {
    label: "position",
    plural: "positions",
    section: "CareerManagement",
    list_path: "career/all",
    list_field: "events",
    create_path: Some("career/add-position"),
    created_field: None,
    create_sends_active: false,
    toggle_path: "career/toggle",
    toggle_id_field: "id",
    toggle_mode: ToggleMode::Flip,
    update_path: None,
    delete_path: None,
    text_fields: &["position_name", "description", "location", "requirements"],
    prefill_aliases: &[],
    required_fields: &["position_name", "description", "requirements"],
    image_slots: &[],
    required_images: &[],
    missing_fields_message: "Please fill in all fields.",
    missing_image_message: MISSING_PHOTO,
};

static ENQUIRY: EndpointConfig = EndpointConfig {
    label: "query",
    plural: "queries",
    section: "EnquiryManagement",
    list_path: "enquiry/get-enquiry",
    list_field: "queries",
    create_path: Some("enquiry/add-enquiry"),
    created_field: None,
    create_sends_active: false,
    toggle_path: "enquiry/change-enquiry-status",
    toggle_id_field: "event_id",
    toggle_mode: ToggleMode::Resolve,
    update_path: None,
    delete_path: None,
    text_fields: &[
        "name",
        "mobileno",
        "email",
        "purpose_id",
        "purpose_name",
        "message",
    ],
    prefill_aliases: &[],
    required_fields: &["name", "mobileno", "email"],
    image_slots: &[],
    required_images: &[],
    missing_fields_message: MISSING_FIELDS,
    missing_image_message: MISSING_PHOTO,
};

static CONTACT_QUERY: EndpointConfig = EndpointConfig {
    label: "query",
    plural: "queries",
    section: "ContactUs",
    list_path: "contactus/get-queries",
    list_field: "queries",
    create_path: None,
    created_field: None,
    create_sends_active: false,
    toggle_path: "contactus/change-query-status",
    toggle_id_field: "event_id",
    toggle_mode: ToggleMode::Resolve,
    update_path: None,
    delete_path: None,
    text_fields: &[],
    prefill_aliases: &[],
    required_fields: &[],
    image_slots: &[],
    required_images: &[],
    missing_fields_message: MISSING_FIELDS,
    missing_image_message: MISSING_PHOTO,
};

static EVENT: EndpointConfig = EndpointConfig {
    label: "event",
    plural: "events",
    section: "EventManagement",
    list_path: "event/get-events",
    list_field: "events",
    create_path: Some("event/add-event"),
    created_field: None,
    create_sends_active: false,
    toggle_path: "event/change-event-status",
    toggle_id_field: "event_id",
    toggle_mode: ToggleMode::Flip,
    update_path: None,
    delete_path: None,
    text_fields: &["title", "description", "event_date", "event_type"],
    prefill_aliases: &[],
    required_fields: &["title"],
    image_slots: &["photo"],
    required_images: &["photo"],
    missing_fields_message: MISSING_FIELDS,
    missing_image_message: MISSING_PHOTO,
};

/// Every kind of item the dashboard manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Service,
    Client,
    Gallery,
    Blog,
    TeamMember,
    Achievement,
    Career,
    Enquiry,
    ContactQuery,
    Event,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::Service,
        ResourceKind::Client,
        ResourceKind::Gallery,
        ResourceKind::Blog,
        ResourceKind::TeamMember,
        ResourceKind::Achievement,
        ResourceKind::Career,
        ResourceKind::Enquiry,
        ResourceKind::ContactQuery,
        ResourceKind::Event,
    ];

    pub fn endpoints(&self) -> &'static EndpointConfig {
        match self {
            ResourceKind::Service => &SERVICE,
            ResourceKind::Client => &CLIENT,
            ResourceKind::Gallery => &GALLERY,
            ResourceKind::Blog => &BLOG,
            ResourceKind::TeamMember => &TEAM,
            ResourceKind::Achievement => &ACHIEVEMENT,
            ResourceKind::Career => &CAREER,
            ResourceKind::Enquiry => &ENQUIRY,
            ResourceKind::ContactQuery => &CONTACT_QUERY,
            ResourceKind::Event => &EVENT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Service => "service",
            ResourceKind::Client => "client",
            ResourceKind::Gallery => "gallery",
            ResourceKind::Blog => "blog",
            ResourceKind::TeamMember => "team",
            ResourceKind::Achievement => "achievement",
            ResourceKind::Career => "career",
            ResourceKind::Enquiry => "enquiry",
            ResourceKind::ContactQuery => "contact",
            ResourceKind::Event => "event",
        }
    }

    /// Kind shown for a dashboard section key.
    pub fn from_section(section: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.endpoints().section == section)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown resource kind '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.as_str().parse::<ResourceKind>().unwrap(), kind);
            assert_eq!(ResourceKind::from_section(kind.endpoints().section), Some(kind));
        }
        assert!("widgets".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_required_images_are_slots() {
        for kind in ResourceKind::ALL {
            let config = kind.endpoints();
            for slot in config.required_images {
                assert!(config.image_slots.contains(slot), "{} {}", kind, slot);
            }
        }
    }

    #[test]
    fn test_blog_has_six_image_slots() {
        assert_eq!(ResourceKind::Blog.endpoints().image_slots.len(), 6);
        assert_eq!(ResourceKind::Blog.endpoints().required_images, &["photo1"]);
    }

    #[test]
    fn test_only_services_edit_and_delete() {
        for kind in ResourceKind::ALL {
            let config = kind.endpoints();
            let editable = config.update_path.is_some() || config.delete_path.is_some();
            assert_eq!(editable, kind == ResourceKind::Service);
        }
    }
}
