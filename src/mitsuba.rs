//! Loading a [`PerspectiveView`] from a Mitsuba scene description.
//!
//! Only the first `<sensor>` element is read:
//!
//! ```xml
//! <scene version="0.5.0">
//!   <sensor type="perspective">
//!     <string name="focalLength" value="35mm"/>
//!     <transform name="toWorld">
//!       <lookAt origin="0, -10, 2" target="0, 0, 0" up="0, 0, 1"/>
//!     </transform>
//!     <film type="hdrfilm">
//!       <integer name="width" value="640"/>
//!       <integer name="height" value="480"/>
//!     </film>
//!   </sensor>
//! </scene>
//! ```

use nalgebra::{convert, geometry::Point3, RealField, Vector3};
use roxmltree::{Document, Node};

use crate::{Error, PerspectiveView};

/// Focal length Mitsuba uses when the sensor does not specify one.
const DEFAULT_FOCAL_LENGTH_MM: f64 = 50.0;

fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(tag))
}

fn named<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
    name: &str,
) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.has_tag_name(tag) && n.attribute("name") == Some(name))
}

fn parse_f64(value: &str, what: &'static str) -> Result<f64, Error> {
    value.trim().parse::<f64>().map_err(|_| Error::InvalidInput(what))
}

/// Parse a comma separated triple such as `"0, -10, 2"`.
fn parse_triple<R: RealField + Copy>(
    value: &str,
    what: &'static str,
) -> Result<Vector3<R>, Error> {
    let mut parts = value.split(',');
    let mut out = Vector3::zeros();
    for i in 0..3 {
        let part = parts.next().ok_or(Error::InvalidInput(what))?;
        out[i] = convert(parse_f64(part, what)?);
    }
    if parts.next().is_some() {
        return Err(Error::InvalidInput(what));
    }
    Ok(out)
}

fn focal_length_mm(sensor: Node<'_, '_>) -> Result<f64, Error> {
    let Some(tag) = named(sensor, "string", "focalLength") else {
        return Ok(DEFAULT_FOCAL_LENGTH_MM);
    };
    let value = tag
        .attribute("value")
        .ok_or(Error::InvalidInput("focalLength has no value"))?;
    let mm = value
        .trim()
        .strip_suffix("mm")
        .ok_or(Error::InvalidInput("focal length must be given in mm"))?;
    parse_f64(mm, "focal length is not a number")
}

fn film_size(film: Node<'_, '_>, name: &str, what: &'static str) -> Result<u32, Error> {
    named(film, "integer", name)
        .and_then(|n| n.attribute("value"))
        .ok_or(Error::InvalidInput(what))?
        .trim()
        .parse::<u32>()
        .map_err(|_| Error::InvalidInput(what))
}

impl<R: RealField + Copy> PerspectiveView<R> {
    /// Create a view from the sensor of a Mitsuba scene file.
    ///
    /// Reads the focal length (`"NNmm"`, 50mm if absent), the `lookAt`
    /// origin, target and up vectors, and the film width and height. Any
    /// other focal length unit, a missing `lookAt` or film size, or a
    /// malformed value gives [`Error::InvalidInput`].
    pub fn from_mitsuba_xml(xml: &str) -> Result<Self, Error> {
        let doc = Document::parse(xml).map_err(|_| Error::InvalidInput("malformed XML"))?;
        let sensor =
            child(doc.root_element(), "sensor").ok_or(Error::InvalidInput("no sensor element"))?;

        let f_mm = focal_length_mm(sensor)?;

        let look_at = child(sensor, "transform")
            .and_then(|t| child(t, "lookAt"))
            .ok_or(Error::InvalidInput("sensor has no lookAt transform"))?;
        let attr = |name: &str, what: &'static str| {
            look_at
                .attribute(name)
                .ok_or(Error::InvalidInput(what))
                .and_then(|v| parse_triple::<R>(v, what))
        };
        let origin = attr("origin", "lookAt origin must be three numbers")?;
        let target = attr("target", "lookAt target must be three numbers")?;
        let up = attr("up", "lookAt up must be three numbers")?;

        let film = child(sensor, "film").ok_or(Error::InvalidInput("sensor has no film"))?;
        let width = film_size(film, "width", "film width must be a positive integer")?;
        let height = film_size(film, "height", "film height must be a positive integer")?;

        log::debug!(
            "mitsuba sensor: {}mm, {}x{}, origin {:?}",
            f_mm,
            width,
            height,
            origin.as_slice()
        );

        Ok(PerspectiveView::new(convert(f_mm), width, height).with_view(
            Point3::from(origin),
            Point3::from(target),
            up,
        ))
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{Point3, RowVector3, Vector3};

    use crate::{Error, PerspectiveView, Points};

    const SCENE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<scene version="0.5.0">
    <integrator type="path"/>
    <sensor type="perspective">
        <string name="focalLength" value="35mm"/>
        <transform name="toWorld">
            <lookAt origin="0, -10, 2" target="0,0,0" up=" 0, 0, 1 "/>
        </transform>
        <film type="hdrfilm">
            <integer name="width" value="640"/>
            <integer name="height" value="480"/>
        </film>
    </sensor>
</scene>"#;

    #[test]
    fn loads_sensor() {
        let view = PerspectiveView::<f64>::from_mitsuba_xml(SCENE).unwrap();
        let expected = PerspectiveView::new(35.0, 640, 480).with_view(
            Point3::new(0.0, -10.0, 2.0),
            Point3::origin(),
            Vector3::new(0.0, 0.0, 1.0),
        );
        assert_eq!(view, expected);

        let target = Points::new(RowVector3::new(0.0, 0.0, 0.0));
        let pix = view.world_to_pixel(&target).unwrap();
        approx::assert_abs_diff_eq!(pix.data[(0, 0)], 320.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(pix.data[(0, 1)], 240.0, epsilon = 1e-9);
    }

    #[test]
    fn missing_focal_length_defaults_to_50mm() {
        let xml = SCENE.replace(r#"<string name="focalLength" value="35mm"/>"#, "");
        let view = PerspectiveView::<f64>::from_mitsuba_xml(&xml).unwrap();
        assert_eq!(view.focal_length_mm(), 50.0);
        assert_eq!(view.width(), 640);
    }

    #[test]
    fn focal_length_must_be_in_mm() {
        let xml = SCENE.replace("35mm", "35deg");
        assert!(matches!(
            PerspectiveView::<f64>::from_mitsuba_xml(&xml),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn missing_tags_are_invalid() {
        for removed in [
            r#"<lookAt origin="0, -10, 2" target="0,0,0" up=" 0, 0, 1 "/>"#,
            r#"<integer name="height" value="480"/>"#,
        ] {
            let xml = SCENE.replace(removed, "");
            assert!(matches!(
                PerspectiveView::<f64>::from_mitsuba_xml(&xml),
                Err(Error::InvalidInput(_))
            ));
        }

        let xml = SCENE.replace(r#"up=" 0, 0, 1 ""#, r#"up="0, 1""#);
        assert!(matches!(
            PerspectiveView::<f64>::from_mitsuba_xml(&xml),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            PerspectiveView::<f64>::from_mitsuba_xml("<scene>"),
            Err(Error::InvalidInput("malformed XML"))
        ));
    }
}
